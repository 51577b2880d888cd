use crate::naming;

/// Trait representing a database table.
/// Implementations are typically declared with the [`table!`](crate::table) macro.
pub trait Table: 'static {
    /// The type containing all column accessors for this table.
    type Columns;

    /// The simple type name of the gateway, e.g. `UserLoginLog`.
    fn type_name() -> &'static str;

    /// Returns the table name as it appears in the database.
    /// Derived from [`Table::type_name`] unless overridden.
    fn table_name() -> String {
        naming::derive_table_name(Self::type_name())
    }

    /// Returns the schema name, if any.
    fn schema() -> Option<&'static str> {
        None
    }

    /// Returns the fully qualified table name (schema.table or just table).
    fn qualified_name() -> String {
        match Self::schema() {
            Some(schema) => format!("{}.{}", schema, Self::table_name()),
            None => Self::table_name(),
        }
    }

    /// The primary key column.
    fn primary_key() -> &'static str {
        "id"
    }

    /// The column used as label in id → label pairs.
    fn label_column() -> &'static str {
        "name"
    }

    /// Returns an instance of the columns accessor for this table.
    fn columns() -> Self::Columns;
}

/// Declare a table type whose name is derived from the identifier.
///
/// ```
/// pgtable::table!(pub struct UserLoginLog);
/// pgtable::table!(pub struct VatRate, primary_key = "code");
///
/// use pgtable::Table;
/// assert_eq!(UserLoginLog::table_name(), "user_login_log");
/// assert_eq!(VatRate::primary_key(), "code");
/// ```
#[macro_export]
macro_rules! table {
    ($vis:vis struct $name:ident) => {
        $crate::table!($vis struct $name, primary_key = "id");
    };
    ($vis:vis struct $name:ident, primary_key = $pk:literal) => {
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::Table for $name {
            type Columns = ();

            fn type_name() -> &'static str {
                stringify!($name)
            }

            fn primary_key() -> &'static str {
                $pk
            }

            fn columns() -> Self::Columns {}
        }
    };
}
