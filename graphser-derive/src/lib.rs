//! `#[derive(GraphCodec)]`: generates the `ToValue`/`FromValue` conversions
//! and the `ObjectCodec` a struct needs to travel through graphser's
//! `Value::Opaque` escape hatch.
//!
//! The struct must also derive (or otherwise implement) `Debug`, since
//! `ObjectValue` is blanket-implemented over `Any + Debug`. Only structs
//! with named fields are supported; tuple structs, unit structs and enums
//! are rejected with a compile error.
extern crate proc_macro;

mod attr;
mod bound;
mod de;
mod ser;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::parse_macro_input;

use crate::bound::where_clause_with_bound;

#[proc_macro_derive(GraphCodec, attributes(graphser))]
pub fn derive_graph_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);
    expand(&input).unwrap_or_else(|err| err.to_compile_error()).into()
}

fn expand(input: &syn::DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let fields = match &input.data {
        syn::Data::Struct(syn::DataStruct { fields: syn::Fields::Named(fields), .. }) => fields,
        _ => {
            return Err(syn::Error::new(
                Span::call_site(),
                "GraphCodec can only be derived for structs with named fields",
            ))
        }
    };

    let name = &input.ident;
    let codec_name = syn::Ident::new(&format!("{name}GraphCodec"), Span::call_site());

    let to_value_impl = ser::expand_to_value(input, fields)?;
    let from_value_impl = de::expand_from_value(input, fields)?;

    let (_, ty_generics, _) = input.generics.split_for_impl();
    let serial_method = ser::expand_serial(name, &ty_generics);
    let deserial_method = de::expand_deserial(name, &ty_generics);

    let codec_bound: proc_macro2::TokenStream = syn::parse_quote! {
        graphser::derive::ToValue + graphser::derive::FromValue + std::fmt::Debug + 'static
    };
    let codec_where_clause = where_clause_with_bound(&input.generics, codec_bound);
    let (codec_impl_generics, _, _) = input.generics.split_for_impl();

    let id_key = name.to_string();

    Ok(quote! {
        #to_value_impl
        #from_value_impl

        #[doc(hidden)]
        pub struct #codec_name #codec_impl_generics #codec_where_clause {
            _marker: std::marker::PhantomData<fn() -> #name #ty_generics>,
        }

        impl #codec_impl_generics std::fmt::Debug for #codec_name #ty_generics #codec_where_clause {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(stringify!(#codec_name))
            }
        }

        impl #codec_impl_generics Default for #codec_name #ty_generics #codec_where_clause {
            fn default() -> Self {
                #codec_name { _marker: std::marker::PhantomData }
            }
        }

        impl #codec_impl_generics #codec_name #ty_generics #codec_where_clause {
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl #codec_impl_generics graphser::ObjectCodec for #codec_name #ty_generics #codec_where_clause {
            fn serializer_id(&self) -> u32 {
                graphser::derive_serializer_id(concat!(module_path!(), "::", #id_key))
            }

            #serial_method

            #deserial_method
        }
    })
}
