// JSON utilities
pub mod json_converter;
pub mod json_view;

// Login redirect helpers
pub mod redirect;

pub use json_converter::{json_type_name, value_to_short_string};
pub use json_view::{sections_from_value, Field, ResultSection, ResultTable};
pub use redirect::{login_url_for, safe_next_path};
