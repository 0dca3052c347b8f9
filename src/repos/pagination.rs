//! Window-count pagination: the page of rows and the total arrive in one
//! round trip via `COUNT(*) OVER ()`.

use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{AstPass, Query, QueryFragment};
use diesel::query_dsl::methods::LoadQuery;
use diesel::sql_types::BigInt;

pub trait Paginate: Sized {
    fn paginate(self, skip: i64, limit: i64) -> Paginated<Self>;
}

impl<T> Paginate for T {
    fn paginate(self, skip: i64, limit: i64) -> Paginated<Self> {
        Paginated {
            query: self,
            skip,
            limit,
        }
    }
}

#[derive(Debug, Clone, Copy, QueryId)]
pub struct Paginated<T> {
    query: T,
    skip: i64,
    limit: i64,
}

impl<T> Paginated<T> {
    /// Loads the page plus the unlimited total row count.
    pub fn load_and_total<U, Conn>(self, conn: &Conn) -> QueryResult<(Vec<U>, i64)>
    where
        Self: LoadQuery<Conn, (U, i64)>,
    {
        let results = self.load::<(U, i64)>(conn)?;
        let total = results.get(0).map(|&(_, total)| total).unwrap_or(0);
        let records = results.into_iter().map(|(record, _)| record).collect();
        Ok((records, total))
    }
}

impl<T: Query> Query for Paginated<T> {
    type SqlType = (T::SqlType, BigInt);
}

impl<T, Conn> RunQueryDsl<Conn> for Paginated<T> {}

impl<T> QueryFragment<Pg> for Paginated<T>
where
    T: QueryFragment<Pg>,
{
    fn walk_ast(&self, mut out: AstPass<Pg>) -> QueryResult<()> {
        out.push_sql("SELECT *, COUNT(*) OVER () FROM (");
        self.query.walk_ast(out.reborrow())?;
        out.push_sql(") t LIMIT ");
        out.push_bind_param::<BigInt, _>(&self.limit)?;
        out.push_sql(" OFFSET ");
        out.push_bind_param::<BigInt, _>(&self.skip)?;
        Ok(())
    }
}

/// One page of results with pagination metadata
#[derive(Debug, Serialize, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, skip: i64, limit: i64) -> Self {
        let size = if limit > 0 { limit } else { 1 };
        Self {
            items,
            total,
            page: skip / size + 1,
            size,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}
