use proc_macro2::TokenStream;
use quote::quote;

use crate::attr::name_of_field;

/// Builds the `FromValue` impl for a struct: reads the field name -> value
/// map back out and constructs the struct, failing on any field that never
/// showed up.
pub fn expand_from_value(input: &syn::DeriveInput, fields: &syn::FieldsNamed) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let field_ident = fields.named.iter().map(|f| f.ident.as_ref().unwrap()).collect::<Vec<_>>();
    let slot_ident = field_ident
        .iter()
        .map(|ident| syn::Ident::new(&format!("__slot_{ident}"), ident.span()))
        .collect::<Vec<_>>();
    let wire_name = fields.named.iter().map(name_of_field).collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl #impl_generics graphser::derive::FromValue for #name #ty_generics #where_clause {
            fn from_value(value: &graphser::Value) -> Result<Self, graphser::Error> {
                let pairs = match value {
                    graphser::Value::Map(m) => m,
                    other => {
                        return Err(graphser::Error::new(
                            graphser::ErrorKind::MalformedHeader,
                            format!("expected a map, got {}", other.kind_name()),
                        ))
                    }
                };

                #(let mut #slot_ident = None;)*

                for (key, field_value) in pairs.borrow().iter() {
                    let key = match key {
                        graphser::Value::Text(t) => t,
                        _ => continue,
                    };
                    match key.as_ref() {
                        #(#wire_name => #slot_ident = Some(graphser::derive::FromValue::from_value(field_value)?),)*
                        _ => {}
                    }
                }

                Ok(#name {
                    #(#field_ident: #slot_ident.ok_or_else(|| graphser::derive::missing_field_error(#wire_name))?,)*
                })
            }
        }
    })
}

/// Builds the `deserial` method of the generated `ObjectCodec`.
pub fn expand_deserial(name: &syn::Ident, ty_generics: &syn::TypeGenerics<'_>) -> TokenStream {
    quote! {
        fn deserial(
            &self,
            tail: &graphser::Header,
            buffers: &[bytes::Bytes],
            _ctx: &mut graphser::DeContext,
        ) -> Result<std::rc::Rc<dyn graphser::ObjectValue>, graphser::Error> {
            let fields = graphser::derive::decode_struct(tail, buffers)?;
            let value = <#name #ty_generics as graphser::derive::FromValue>::from_value(&fields)?;
            Ok(std::rc::Rc::new(value) as std::rc::Rc<dyn graphser::ObjectValue>)
        }
    }
}
