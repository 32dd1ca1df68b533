//! PostGIS-backed spatial store.
//!
//! SQL text is assembled from registry identifiers only; every request value
//! is a bound parameter.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{CodeMatch, LevelRow, Predicate, RowQuery, SpatialStore, StoreError, StoreResult};
use crate::models::GeoPoint;
use crate::registry::LevelSchema;

#[derive(Clone)]
pub struct PostgisStore {
    pool: PgPool,
}

impl PostgisStore {
    pub async fn new(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        info!("Connecting to PostGIS...");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.ping().await?;
        info!("Connected to PostGIS");
        Ok(store)
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run(&self, query: &RowQuery, single: bool) -> StoreResult<Vec<LevelRow>> {
        let sql = select_sql(query, single);
        debug!(relation = query.schema.relation, single, "PostGIS row query");

        let mut q = sqlx::query(&sql);
        match &query.predicate {
            Some(Predicate::Id(id)) => q = q.bind(*id),
            Some(Predicate::Code(code)) => {
                for value in code_params(code) {
                    q = q.bind(value);
                }
            }
            None => {}
        }
        if let Some(tolerance) = query.simplify {
            q = q.bind(tolerance);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter().map(decode_row).collect()
    }
}

/// Bound values of a code predicate, in placeholder order.
fn code_params(code: &CodeMatch) -> Vec<String> {
    match code {
        CodeMatch::Exact(literal) => vec![literal.clone()],
        CodeMatch::Prefix(_) => vec![code.like_pattern()],
        CodeMatch::Group(literal) => vec![literal.clone(), code.like_pattern()],
    }
}

/// A code predicate rendered against one column.
struct CodeSql {
    condition: String,
    /// Leading `ORDER BY` term that puts the literal code first, or empty
    rank: String,
}

/// Render `code` against `column` with placeholders numbered from `first`.
fn code_sql(column: &str, code: &CodeMatch, first: usize) -> CodeSql {
    match code {
        CodeMatch::Exact(_) => CodeSql {
            condition: format!("{} = ${}", column, first),
            rank: String::new(),
        },
        CodeMatch::Prefix(_) => CodeSql {
            condition: format!("{} LIKE ${} ESCAPE '\\'", column, first),
            rank: String::new(),
        },
        CodeMatch::Group(_) => CodeSql {
            condition: format!(
                "({col} = ${} OR {col} LIKE ${} ESCAPE '\\')",
                first,
                first + 1,
                col = column
            ),
            rank: format!("({} = ${}) DESC, ", column, first),
        },
    }
}

/// Best single row for `code`: the literal code first, then the lowest id.
fn resolve_sql(schema: &LevelSchema, code: &CodeMatch, first: usize, select: &str) -> String {
    let code = code_sql(schema.code_column, code, first);
    format!(
        "SELECT {select} FROM {relation} WHERE {condition} ORDER BY {rank}{id} ASC LIMIT 1",
        relation = schema.relation,
        condition = code.condition,
        rank = code.rank,
        id = schema.id_column,
    )
}

fn select_sql(query: &RowQuery, single: bool) -> String {
    let s = query.schema;
    let mut params = 0;
    let mut rank = String::new();

    let where_clause = match &query.predicate {
        None => String::new(),
        Some(Predicate::Id(_)) => {
            params += 1;
            format!(" WHERE {} = ${}::int8", s.id_column, params)
        }
        Some(Predicate::Code(code)) => {
            let rendered = code_sql(s.code_column, code, params + 1);
            params += code_params(code).len();
            rank = rendered.rank;
            format!(" WHERE {}", rendered.condition)
        }
    };

    let geometry = match query.simplify {
        Some(_) => {
            params += 1;
            format!(
                "ST_SimplifyPreserveTopology({}, ${}::float8)",
                s.geometry_column, params
            )
        }
        None => s.geometry_column.to_string(),
    };

    let order = if single {
        format!(" ORDER BY {}{} ASC LIMIT 1", rank, s.id_column)
    } else {
        format!(" ORDER BY {}, {}", s.order_by, s.id_column)
    };

    format!(
        "SELECT {id}::int8 AS id, COALESCE({name}, '') AS name, {code} AS code, \
         ST_AsGeoJSON({geometry}) AS geom FROM {relation}{where_clause}{order}",
        id = s.id_column,
        name = s.name_column,
        code = s.code_column,
        relation = s.relation,
    )
}

/// Points ride in as two arrays (`$1` lon, `$2` lat); the boundary is
/// resolved once, by the same ranking as a single-row lookup.
fn points_within_sql(schema: &LevelSchema, code: &CodeMatch) -> String {
    let target = resolve_sql(schema, code, 3, &format!("{} AS geom", schema.geometry_column));
    format!(
        "WITH target AS ({target}) \
         SELECT (p.idx - 1)::int8 AS idx \
         FROM unnest($1::float8[], $2::float8[]) WITH ORDINALITY AS p(lon, lat, idx), target t \
         WHERE ST_Contains(t.geom, ST_SetSRID(ST_MakePoint(p.lon, p.lat), 4326)) \
         ORDER BY p.idx"
    )
}

fn decode_row(row: &PgRow) -> StoreResult<LevelRow> {
    let query_err = |e: sqlx::Error| StoreError::Query(e.to_string());

    let code: String = row.try_get("code").map_err(query_err)?;
    let geometry = match row.try_get::<Option<String>, _>("geom").map_err(query_err)? {
        Some(text) => {
            serde_json::from_str(&text).map_err(|e| StoreError::MalformedGeometry {
                code: code.clone(),
                reason: e.to_string(),
            })?
        }
        None => serde_json::Value::Null,
    };

    Ok(LevelRow {
        id: row.try_get("id").map_err(query_err)?,
        name: row.try_get("name").map_err(query_err)?,
        code,
        geometry,
    })
}

#[async_trait]
impl SpatialStore for PostgisStore {
    async fn fetch_one(&self, query: &RowQuery) -> StoreResult<Option<LevelRow>> {
        Ok(self.run(query, true).await?.into_iter().next())
    }

    async fn fetch_all(&self, query: &RowQuery) -> StoreResult<Vec<LevelRow>> {
        self.run(query, false).await
    }

    async fn points_within(
        &self,
        schema: &'static LevelSchema,
        code: &CodeMatch,
        points: &[GeoPoint],
    ) -> StoreResult<Vec<usize>> {
        let sql = points_within_sql(schema, code);

        let lons: Vec<f64> = points.iter().map(|p| p.lon).collect();
        let lats: Vec<f64> = points.iter().map(|p| p.lat).collect();

        let mut q = sqlx::query(&sql).bind(lons).bind(lats);
        for value in code_params(code) {
            q = q.bind(value);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<i64, _>("idx")
                    .map(|i| i as usize)
                    .map_err(|e| StoreError::Query(e.to_string()))
            })
            .collect()
    }

    async fn boundary_exists(
        &self,
        schema: &'static LevelSchema,
        code: &CodeMatch,
    ) -> StoreResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {})",
            schema.relation,
            code_sql(schema.code_column, code, 1).condition
        );
        let mut q = sqlx::query_scalar::<_, bool>(&sql);
        for value in code_params(code) {
            q = q.bind(value);
        }
        q.fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "postgis"
    }
}
