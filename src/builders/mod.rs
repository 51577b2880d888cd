mod insert;
mod select;
mod update;

pub use insert::Insert;
pub use select::{Select, SelectWithColumns, Selection};
pub use update::Update;
