use proc_macro2::TokenStream;
use quote::quote;

use crate::attr::name_of_field;

/// Builds the `ToValue` impl for a struct: a field name -> field value map,
/// per the wire representation documented on `graphser::derive`.
pub fn expand_to_value(input: &syn::DeriveInput, fields: &syn::FieldsNamed) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut entries = Vec::new();
    for field in &fields.named {
        let ident = field.ident.as_ref().unwrap();
        let wire_name = name_of_field(field)?;
        entries.push(quote! {
            (graphser::Value::text(#wire_name), graphser::derive::ToValue::to_value(&self.#ident))
        });
    }

    Ok(quote! {
        impl #impl_generics graphser::derive::ToValue for #name #ty_generics #where_clause {
            fn to_value(&self) -> graphser::Value {
                graphser::Value::map(vec![#(#entries),*])
            }
        }
    })
}

/// Builds the `serial` method of the generated `ObjectCodec`: downcast the
/// opaque value back to the concrete struct, then hand its `ToValue` tree
/// to `encode_struct`.
pub fn expand_serial(name: &syn::Ident, ty_generics: &syn::TypeGenerics<'_>) -> TokenStream {
    let expect_msg = format!("expected a {}", name);
    quote! {
        fn serial(
            &self,
            value: &dyn graphser::ObjectValue,
        ) -> Result<(graphser::Header, Vec<bytes::Bytes>), graphser::Error> {
            let value = graphser::ObjectValue::as_any(value)
                .downcast_ref::<#name #ty_generics>()
                .ok_or_else(|| graphser::Error::new(graphser::ErrorKind::Codec, #expect_msg))?;
            graphser::derive::encode_struct(graphser::derive::ToValue::to_value(value))
        }
    }
}
