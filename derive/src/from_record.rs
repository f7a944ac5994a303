use std::collections::HashSet;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Result,
    parse::{Parse, ParseStream},
    spanned::Spanned,
};

pub(crate) fn expand_from_record(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new(
            input.span(),
            "`FromRecord` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new(
            input.span(),
            "`FromRecord` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for field in &fields {
        if let Source::Record(key) = &field.source {
            if !seen.insert(key.value()) {
                Err(Error::new(key.span(), "Record field names must be unique."))?;
            }
        }
    }

    let assignments = fields.iter().map(|field| {
        let name = &field.name;
        match &field.source {
            Source::Record(key) => quote! {
                #name: record.field(#key)?
            },
            Source::Skip => quote! {
                #name: ::core::default::Default::default()
            },
        }
    });

    let name = &input.ident;
    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::blobscope::FromRecord for #name #type_generics #where_clause {
            fn from_record(
                record: &::blobscope::Record,
            ) -> ::core::result::Result<Self, ::blobscope::Error> {
                ::core::result::Result::Ok(Self {
                    #(#assignments,)*
                })
            }
        }

        impl #impl_generics ::blobscope::FromValue for #name #type_generics #where_clause {
            fn from_value(
                value: &::blobscope::Value,
            ) -> ::core::result::Result<Self, ::blobscope::Error> {
                let record: ::blobscope::Record = ::blobscope::FromValue::from_value(value)?;
                <Self as ::blobscope::FromRecord>::from_record(&record)
            }
        }
    };

    Ok(expanded.into())
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    source: Source,
}

/// Where a struct field's value comes from.
#[derive(Debug)]
enum Source {
    Record(LitStr),
    Skip,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Self> {
        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Field must be named."))?
        };

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("field")) else {
            let key = name.to_string();
            let key = key.strip_prefix("r#").unwrap_or(&key);
            return Ok(Self {
                source: Source::Record(LitStr::new(key, name.span())),
                name,
            });
        };

        let source = attr.meta.require_list()?.parse_args()?;

        Ok(Self { name, source })
    }
}

impl Parse for Source {
    fn parse(input: ParseStream) -> Result<Self> {
        if let Ok(ident) = input.parse::<Ident>() {
            if ident == "skip" {
                return Ok(Source::Skip);
            }

            Err(Error::new_spanned(
                ident,
                "Field attribute must be a string literal or `skip`.",
            ))?;
        }

        Ok(Source::Record(input.parse::<LitStr>()?))
    }
}
