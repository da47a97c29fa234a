//! Code generation for the `Model` trait implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

use crate::parsing::{FieldInfo, TableInfo};

pub fn generate_model_impl(name: &Ident, table_info: &TableInfo, field_info: &FieldInfo) -> TokenStream {
    let table_name = &table_info.name;
    let columns = &field_info.columns;
    let primary_key: Vec<String> = field_info
        .primary_key
        .iter()
        .map(ToString::to_string)
        .collect();

    quote! {
        impl query_set::Model for #name {
            fn table_name() -> &'static str {
                #table_name
            }

            fn columns() -> &'static [&'static str] {
                &[#(#columns),*]
            }

            fn primary_key() -> &'static [&'static str] {
                &[#(#primary_key),*]
            }
        }
    }
}
