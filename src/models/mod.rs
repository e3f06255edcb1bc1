pub(crate) mod lenient;

pub mod custom_field;
pub mod issue;
pub mod link;
pub mod project;
pub mod search;
pub mod user;
pub mod work_item;

pub use custom_field::*;
pub use issue::*;
pub use link::*;
pub use project::*;
pub use search::*;
pub use user::*;
pub use work_item::*;
