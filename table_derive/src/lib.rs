//! Procedural macros for generating table metadata
//!
//! This crate provides the `#[model]` macro and `Model` derive, which implement
//! `query_set::Model` for a struct: its table name, its columns in declaration
//! order and its primary key.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod impl_generation;
mod model_macro;
mod parsing;

use impl_generation::generate_model_impl;
use model_macro::model_attribute;
use parsing::{parse_field_attributes, parse_table_attributes};

/// Derive macro for the `Model` trait
///
/// Note: It's recommended to use the `#[model]` attribute macro instead,
/// which automatically includes this derive along with serde's.
///
/// ```rust,ignore
/// #[derive(Debug, serde::Deserialize, Model)]
/// #[table(name = "person")]
/// pub struct Person {
///     #[primary_key]
///     pub id: i64,
///     pub name: String,
///     pub income: i64,
/// }
/// ```
#[proc_macro_derive(Model, attributes(table, primary_key))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    let table_info = match parse_table_attributes(&input.attrs) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let field_info = match parse_field_attributes(&input.data) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(generate_model_impl(name, &table_info, &field_info))
}

/// Convenience attribute macro that adds all necessary derives for a model
///
/// Usage:
/// ```rust,ignore
/// use queryhaus::prelude::*;
///
/// #[model]
/// #[table(name = "person")]
/// pub struct Person {
///     #[primary_key]
///     pub id: i64,
///     pub name: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    model_attribute(attr, item)
}
