pub mod calculations;
pub mod models;
pub mod state;

pub use calculations::{Form1040Result, ReturnError, calculate_return};
pub use models::*;
pub use state::{ColoradoForm104Result, FullReturn, calculate_full_return};
