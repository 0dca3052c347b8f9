//! Macros for the whole app

/// Maps a unit enum onto a `VarChar` column, both directions, plus
/// `FromStr`/`Display` for query params and error messages. The db string
/// form must match the named database enum values exactly.
macro_rules! impl_varchar_enum {
    ($ty:ident, { $($variant:ident => $val:expr),+ $(,)* }) => {
        impl ::diesel::types::NotNull for $ty {}
        impl ::diesel::types::SingleValue for $ty {}

        impl ::diesel::types::FromSqlRow<::diesel::sql_types::VarChar, ::diesel::pg::Pg> for $ty {
            fn build_from_row<R: ::diesel::row::Row<::diesel::pg::Pg>>(
                row: &mut R,
            ) -> Result<Self, Box<::std::error::Error + Send + Sync>> {
                match row.take() {
                    $(Some(value) if value == $val.as_bytes() => Ok($ty::$variant),)+
                    Some(value) => Err(format!(
                        "Unrecognized enum variant for {}: {}",
                        stringify!($ty),
                        ::std::str::from_utf8(value).unwrap_or("unreadable value")
                    ).into()),
                    None => Err(concat!(
                        "Unexpected null for non-null column `",
                        stringify!($ty),
                        "`"
                    ).into()),
                }
            }
        }

        impl ::diesel::deserialize::Queryable<::diesel::sql_types::VarChar, ::diesel::pg::Pg> for $ty {
            type Row = $ty;
            fn build(row: Self::Row) -> Self {
                row
            }
        }

        impl ::diesel::types::ToSql<::diesel::sql_types::VarChar, ::diesel::pg::Pg> for $ty {
            fn to_sql<W: ::std::io::Write>(
                &self,
                out: &mut ::diesel::serialize::Output<W, ::diesel::pg::Pg>,
            ) -> Result<::diesel::types::IsNull, Box<::std::error::Error + Send + Sync>> {
                match *self {
                    $($ty::$variant => out.write_all($val.as_bytes())?,)+
                }
                Ok(::diesel::types::IsNull::No)
            }
        }

        impl ::diesel::expression::AsExpression<::diesel::sql_types::VarChar> for $ty {
            type Expression =
                ::diesel::expression::bound::Bound<::diesel::sql_types::VarChar, $ty>;
            fn as_expression(self) -> Self::Expression {
                ::diesel::expression::bound::Bound::new(self)
            }
        }

        impl<'a> ::diesel::expression::AsExpression<::diesel::sql_types::VarChar> for &'a $ty {
            type Expression =
                ::diesel::expression::bound::Bound<::diesel::sql_types::VarChar, &'a $ty>;
            fn as_expression(self) -> Self::Expression {
                ::diesel::expression::bound::Bound::new(self)
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($val => Ok($ty::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                let name = match *self {
                    $($ty::$variant => $val,)+
                };
                write!(f, "{}", name)
            }
        }
    };
}

/// Parses query parameters into a tuple of `Option<T>` values, e.g.
/// `parse_query!(req.query().unwrap_or_default(), "skip" => i64, "limit" => i64)`.
macro_rules! parse_query {
    ($query:expr, $($name:tt => $t:ty),+ $(,)*) => {{
        let params = $crate::http::request_util::query_params($query);
        ($(
            params
                .get($name)
                .and_then(|value| value.parse::<$t>().ok())
        ),+)
    }};
}
