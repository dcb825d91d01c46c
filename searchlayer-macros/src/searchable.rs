use proc_macro2::{Ident, Span, TokenStream};
use quote::{ToTokens, quote};
use syn::{Data, DeriveInput, Error, Fields, GenericArgument, PathArguments, Type};

use crate::attrs::{ContainerAttrs, FieldAttrs, Nested};

// derive_searchable
pub fn derive_searchable(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    expand(&input).unwrap_or_else(Error::into_compile_error)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Searchable can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                ident,
                "Searchable can only be derived for structs with named fields",
            ));
        }
    };

    let container = ContainerAttrs::parse(&input.attrs)?;
    let type_name = ident.to_string();

    let mut properties = Vec::new();
    let mut id_field: Option<(Ident, String, bool, &Type)> = None;

    for field in fields {
        let attrs = FieldAttrs::parse(field)?;
        if attrs.skip {
            continue;
        }

        let Some(field_ident) = field.ident.clone() else {
            continue;
        };
        let name = property_name(&field_ident, &attrs, &container);

        if attrs.id {
            if id_field.is_some() {
                return Err(Error::new_spanned(field, "only one field can be the id"));
            }
            id_field = Some((field_ident.clone(), name.clone(), attrs.auto_generate, &field.ty));
        }

        properties.push(property_tokens(&name, &attrs, &field.ty)?);
    }

    let document_type = container
        .document_type
        .as_ref()
        .map(|name| quote! { .document_type(#name) });
    let index = container.index.as_ref().map(|name| quote! { .index(#name) });
    let strategy = container
        .strategy
        .as_ref()
        .map(|strategy| quote! { .index_strategy(#strategy) });
    let id_config = id_field
        .as_ref()
        .map(|(_, name, auto_generate, _)| quote! { .id(#name, #auto_generate) });

    let id_fn = id_field.as_ref().map(|(field_ident, _, _, ty)| {
        let value = if is_option(ty) {
            quote! { self.#field_ident.as_ref().map(::std::string::ToString::to_string) }
        } else {
            quote! { ::std::option::Option::Some(::std::string::ToString::to_string(&self.#field_ident)) }
        };

        quote! {
            fn id(&self) -> ::std::option::Option<::std::string::String> {
                #value
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::searchlayer::document::Searchable for #ident #ty_generics #where_clause {
            fn schema() -> ::searchlayer::schema::TypeSchema {
                #[allow(unused_imports)]
                use ::searchlayer::schema::{
                    FieldMapping, FieldType, PropertyDescriptor, TypeArgument, TypeSchema,
                };

                TypeSchema::builder(#type_name)
                    #document_type
                    #index
                    #strategy
                    #id_config
                    #(.property(#properties))*
                    .build()
            }

            #id_fn
        }
    })
}

fn property_name(field: &Ident, attrs: &FieldAttrs, container: &ContainerAttrs) -> String {
    let raw = field.to_string();
    let raw = raw.strip_prefix("r#").unwrap_or(&raw);

    match (&attrs.rename, container.rename_all) {
        (Some(rename), _) => rename.clone(),
        (None, Some(rule)) => rule.apply(raw),
        (None, None) => raw.to_string(),
    }
}

fn property_tokens(name: &str, attrs: &FieldAttrs, ty: &Type) -> syn::Result<TokenStream> {
    let mut tokens = quote! { PropertyDescriptor::new(#name) };

    if let Some(variant) = attrs.field_type_variant() {
        let variant = Ident::new(variant, Span::call_site());
        let filterable = attrs
            .filterable
            .as_ref()
            .map(|value| quote! { .filterable(#value) });
        let free_text = attrs
            .free_text_searchable
            .as_ref()
            .map(|value| quote! { .free_text_searchable(#value) });

        tokens.extend(quote! {
            .mapped(FieldMapping::new(FieldType::#variant) #filterable #free_text)
        });
    }

    let arguments = type_arguments(ty);
    if !arguments.is_empty() {
        let arguments = arguments
            .iter()
            .map(|argument| type_argument_tokens(argument, attrs.nested.as_ref()))
            .collect::<Vec<_>>();

        tokens.extend(quote! { .generic([#(#arguments),*]) });
    } else if attrs.nested.is_some() {
        return Err(Error::new_spanned(
            ty,
            "`nested` requires a field type with type arguments",
        ));
    }

    if attrs.write_only {
        tokens.extend(quote! { .write_only() });
    }

    Ok(tokens)
}

fn type_argument_tokens(argument: &Type, nested: Option<&Nested>) -> TokenStream {
    let stored = match nested {
        None => false,
        Some(Nested::All) => true,
        Some(Nested::Only(types)) => {
            let argument = argument.to_token_stream().to_string();
            types
                .iter()
                .any(|ty| ty.to_token_stream().to_string() == argument)
        }
    };

    if stored {
        quote! {
            TypeArgument::Schema(<#argument as ::searchlayer::document::Searchable>::schema)
        }
    } else {
        quote! { TypeArgument::Opaque }
    }
}

// type_arguments
// the type arguments of the last path segment, `[T]` for `Vec<T>`
fn type_arguments(ty: &Type) -> Vec<&Type> {
    let Type::Path(path) = ty else {
        return Vec::new();
    };
    let Some(segment) = path.path.segments.last() else {
        return Vec::new();
    };
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return Vec::new();
    };

    arguments
        .args
        .iter()
        .filter_map(|argument| match argument {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
        .collect()
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(input: TokenStream) -> String {
        derive_searchable(input).to_string()
    }

    #[test]
    fn expands_container_and_field_configuration() {
        let expanded = expand_str(quote! {
            #[search(index = "twitter", document_type = "tweet")]
            #[serde(rename_all = "camelCase")]
            struct Tweet {
                #[search(id)]
                id: String,
                #[search(kind = "string", filterable = false, free_text_searchable = true)]
                message: String,
                #[search(kind = "date")]
                post_date: String,
            }
        });

        assert!(expanded.contains(". document_type (\"tweet\")"));
        assert!(expanded.contains(". index (\"twitter\")"));
        assert!(expanded.contains(". id (\"id\" , false)"));
        assert!(expanded.contains("PropertyDescriptor :: new (\"postDate\")"));
        assert!(expanded.contains("FieldType :: Date"));
        assert!(expanded.contains(". free_text_searchable (true)"));
    }

    #[test]
    fn nested_arguments_reference_their_schema() {
        let expanded = expand_str(quote! {
            struct Thread {
                #[search(nested)]
                replies: Vec<Reply>,
                tags: Vec<String>,
            }
        });

        assert!(expanded.contains("TypeArgument :: Schema (< Reply as :: searchlayer :: document :: Searchable > :: schema)"));
        assert!(expanded.contains("TypeArgument :: Opaque"));
    }

    #[test]
    fn skipped_fields_are_not_properties() {
        let expanded = expand_str(quote! {
            struct Tweet {
                message: String,
                #[search(skip)]
                cache: String,
                #[serde(skip)]
                scratch: String,
            }
        });

        assert!(expanded.contains("\"message\""));
        assert!(!expanded.contains("\"cache\""));
        assert!(!expanded.contains("\"scratch\""));
    }

    #[test]
    fn optional_ids_are_mapped() {
        let expanded = expand_str(quote! {
            struct Tweet {
                #[search(id, auto_generate)]
                id: Option<String>,
            }
        });

        assert!(expanded.contains(". id (\"id\" , true)"));
        assert!(expanded.contains("as_ref () . map"));
    }

    #[test]
    fn flags_without_kind_are_rejected() {
        let expanded = expand_str(quote! {
            struct Tweet {
                #[search(filterable = false)]
                message: String,
            }
        });

        assert!(expanded.contains("compile_error"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let expanded = expand_str(quote! {
            struct Tweet {
                #[search(kind = "text")]
                message: String,
            }
        });

        assert!(expanded.contains("unknown field type"));
    }
}
