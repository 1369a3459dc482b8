//! State returns computed from a finished federal return.

pub mod colorado;

pub use colorado::{
    ColoradoForm104Result, FullReturn, calculate_colorado_104, calculate_full_return,
    colorado_source_income,
};
