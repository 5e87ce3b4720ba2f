//! Provides derive macros for `sweep::ids::ResourceId`.
use quote::quote;
use syn::{Attribute, Data, DataStruct, DeriveInput, Fields, FieldsNamed};

struct Parts {
    idents: Vec<syn::Ident>,
    /// Index of the part that may contain the separator.
    rest: usize,
}

fn is_rest(field: &syn::Field) -> syn::Result<bool> {
    let mut rest = false;
    for att in field.attrs.iter().filter(|att| att.path().is_ident("resource_id")) {
        att.parse_nested_meta(|meta| {
            if meta.path.is_ident("rest") {
                rest = true;
                Ok(())
            } else {
                Err(meta.error("unknown field attribute - must be 'rest'"))
            }
        })?;
    }
    Ok(rest)
}

fn get_parts(input: &DeriveInput) -> syn::Result<Parts> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(FieldsNamed { named, .. }),
            ..
        }) => named,
        _ => {
            return Err(syn::Error::new(
                name.span(),
                "deriving ResourceId only supports structs with named fields".to_string(),
            ));
        }
    };
    if fields.len() < 2 {
        return Err(syn::Error::new(
            name.span(),
            "deriving ResourceId requires at least two fields".to_string(),
        ));
    }

    let idents = fields
        .iter()
        // UNWRAP: safe because we only support structs with named fields
        .map(|field| field.ident.clone().unwrap())
        .collect();
    let mut rest = None;
    for (i, field) in fields.iter().enumerate() {
        if is_rest(field)? && rest.replace(i).is_some() {
            return Err(syn::Error::new(
                name.span(),
                "only one field can be marked #[resource_id(rest)]".to_string(),
            ));
        }
    }
    Ok(Parts {
        idents,
        rest: rest.unwrap_or(fields.len() - 1),
    })
}

#[derive(Debug)]
struct IdDetails {
    separator: syn::LitStr,
}

fn get_id_details(input: &DeriveInput) -> syn::Result<IdDetails> {
    let mut separator = None;
    for att in input.attrs.iter().filter(|att: &&Attribute| att.path().is_ident("resource_id")) {
        att.parse_nested_meta(|meta| {
            if meta.path.is_ident("separator") {
                let value = meta.value()?;
                let lit: syn::LitStr = value.parse()?;
                if lit.value().is_empty() {
                    return Err(meta.error("the separator must not be empty"));
                }
                separator = Some(lit);
                Ok(())
            } else {
                Err(meta.error(format!(
                    "unknown attribute {:?} - must be 'separator'",
                    meta.path
                        .get_ident()
                        .map(|id| id.to_string())
                        .unwrap_or("unknown".to_string())
                )))
            }
        })?;
    }
    Ok(IdDetails {
        separator: separator
            .unwrap_or_else(|| syn::LitStr::new(":", proc_macro2::Span::call_site())),
    })
}

/// Derives `Display`, `FromStr` and `sweep::ids::ResourceId` for a struct
/// whose named `String` fields are the parts of a composite identifier.
///
/// The separator defaults to `":"` and can be set with
/// `#[resource_id(separator = ",")]`. One field may contain the separator:
/// the last one, or the one marked `#[resource_id(rest)]`. Parsing splits
/// the parts before it from the left and the parts after it from the right.
#[proc_macro_derive(ResourceId, attributes(resource_id))]
pub fn derive_resource_id(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input: DeriveInput = syn::parse_macro_input!(input);
    let name = &input.ident;

    let IdDetails { separator } = match get_id_details(&input) {
        Ok(d) => d,
        Err(e) => return e.into_compile_error().into(),
    };
    let Parts { idents, rest } = match get_parts(&input) {
        Ok(p) => p,
        Err(e) => return e.into_compile_error().into(),
    };
    let count = idents.len();
    let before = rest;
    let after = count - rest - 1;
    let field_names: Vec<String> = idents.iter().map(|id| id.to_string()).collect();
    let expected = field_names.join(&separator.value());

    let output = quote! {
        impl core::fmt::Display for #name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&[#(self.#idents.as_str()),*].join(#separator))
            }
        }

        impl core::str::FromStr for #name {
            type Err = sweep::ids::ParseIdError;

            fn from_str(id: &str) -> Result<Self, Self::Err> {
                let fail = || sweep::ids::ParseIdError::new(id, #expected);
                let mut head = id.splitn(#before + 1, #separator);
                let mut parts: Vec<&str> = Vec::with_capacity(#count);
                for _ in 0..#before {
                    parts.push(head.next().ok_or_else(fail)?);
                }
                let rest = head.next().ok_or_else(fail)?;
                let mut tail: Vec<&str> = rest.rsplitn(#after + 1, #separator).collect();
                if tail.len() != #after + 1 {
                    return Err(fail());
                }
                tail.reverse();
                parts.extend(tail);
                if parts.iter().any(|part| part.is_empty()) {
                    return Err(fail());
                }
                let mut parts = parts.into_iter();
                Ok(#name {
                    #(#idents: parts.next().unwrap_or_default().to_owned(),)*
                })
            }
        }

        impl sweep::ids::ResourceId for #name {
            const SEPARATOR: &'static str = #separator;
            const FIELDS: &'static [&'static str] = &[#(#field_names),*];
        }
    };
    output.into()
}
