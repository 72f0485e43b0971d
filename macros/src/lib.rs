use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{ext::IdentExt, parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit};

/// Expression-free values accepted inside `#[loadable(...)]`
enum MetaValue {
    Str(String),
    Flag,
}

/// Check for a struct-level `#[loadable(hooks)]`
fn has_hooks_flag(attrs: &[Attribute]) -> syn::Result<bool> {
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("loadable")) {
        let parsed = parse_loadable_list(attr)?;
        if let Some((key, _)) = parsed.iter().find(|(key, _)| key.as_str() != "hooks") {
            return Err(syn::Error::new_spanned(
                attr,
                format!("unknown struct option `{}`, expected `hooks`", key),
            ));
        }
        if parsed.contains_key("hooks") {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Main macro for defining structs bound to a configuration store
#[proc_macro]
pub fn define_loadable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_loadable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `ConfigEnum` for an enum with only unit variants
#[proc_macro_derive(ConfigEnum)]
pub fn derive_config_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_config_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_loadable(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let vis = &input.vis;
    let struct_attrs = &input.attrs;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "define_loadable! does not support generic structs",
        ));
    }

    let user_hooks = has_hooks_flag(struct_attrs)?;

    // Extract fields from the struct
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "define_loadable! only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "define_loadable! only supports structs",
            ));
        }
    };

    let mut field_defs = Vec::new();
    let mut bindings = Vec::new();

    for field in fields {
        let field_name = match &field.ident {
            Some(ident) => ident,
            None => {
                return Err(syn::Error::new_spanned(field, "expected a named field"));
            }
        };
        let field_vis = &field.vis;
        let field_type = &field.ty;

        // Everything except our own attribute stays on the field
        let kept_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| !attr.path().is_ident("loadable"))
            .collect();
        field_defs.push(quote! {
            #(#kept_attrs)*
            #field_vis #field_name: #field_type
        });

        let Some(config) = parse_field_config(field)? else {
            continue;
        };

        let member_name = field_name.unraw().to_string();
        let default = &config.default;
        let tag = config.tag.as_ref().map(|tag| quote! { .tag(#tag) });
        let key = config.key.as_ref().map(|key| quote! { .key(#key) });

        bindings.push(quote! {
            .field(
                ::tagconf::Member::new(#member_name).default(#default) #tag #key,
                |target: &#struct_name| &target.#field_name,
                |target: &mut #struct_name, value: #field_type| target.#field_name = value,
            )
        });
    }

    // Struct-level `#[loadable(...)]` is consumed here
    let filtered_attrs: Vec<&Attribute> = struct_attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("loadable"))
        .collect();

    let struct_def = quote! {
        #(#filtered_attrs)*
        #vis struct #struct_name {
            #(#field_defs),*
        }
    };

    let loadable_impl = quote! {
        impl ::tagconf::Loadable for #struct_name {
            fn binder() -> &'static ::tagconf::Binder<Self> {
                static BINDER: ::tagconf::macros::OnceLock<::tagconf::Binder<#struct_name>> =
                    ::tagconf::macros::OnceLock::new();

                BINDER.get_or_init(|| {
                    ::tagconf::Binder::new()
                        #(#bindings)*
                })
            }
        }
    };

    let hooks_impl = if user_hooks {
        quote! {}
    } else {
        quote! {
            impl ::tagconf::ConfigHooks for #struct_name {}
        }
    };

    Ok(quote! {
        #struct_def
        #loadable_impl
        #hooks_impl
    })
}

fn generate_config_enum(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let enum_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ConfigEnum does not support generic enums",
        ));
    }

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "ConfigEnum can only be derived for enums",
            ));
        }
    };

    let mut entries = Vec::new();
    for variant in variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "ConfigEnum variants must not carry data",
            ));
        }
        let ident = &variant.ident;
        let name = ident.unraw().to_string();
        entries.push(quote! { (#name, #enum_name::#ident) });
    }

    Ok(quote! {
        impl ::tagconf::ConfigEnum for #enum_name {
            const VARIANTS: &'static [(&'static str, Self)] = &[#(#entries),*];
        }
    })
}

#[derive(Debug)]
struct FieldConfig {
    default: String,
    tag: Option<String>,
    key: Option<String>,
}

/// Parse `#[loadable(default = "X", tag = "Y", key = "Z")]` syntax
fn parse_loadable_list(attr: &Attribute) -> syn::Result<HashMap<String, MetaValue>> {
    let mut values = HashMap::new();

    attr.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("expected identifier"))?
            .to_string();

        if meta.input.peek(syn::Token![=]) {
            let lit: Lit = meta.value()?.parse()?;
            let text = match lit {
                Lit::Str(s) => s.value(),
                Lit::Int(i) => i.base10_digits().to_string(),
                Lit::Float(f) => f.base10_digits().to_string(),
                Lit::Bool(b) => b.value.to_string(),
                Lit::Char(c) => c.value().to_string(),
                other => return Err(syn::Error::new_spanned(other, "unsupported literal")),
            };
            values.insert(key, MetaValue::Str(text));
        } else {
            values.insert(key, MetaValue::Flag);
        }

        Ok(())
    })?;

    Ok(values)
}

fn parse_field_config(field: &syn::Field) -> syn::Result<Option<FieldConfig>> {
    let mut attrs = field
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("loadable"));
    let Some(attr) = attrs.next() else {
        return Ok(None);
    };
    if let Some(extra) = attrs.next() {
        return Err(syn::Error::new_spanned(
            extra,
            "only one #[loadable(...)] attribute is allowed per field",
        ));
    }

    let parsed = parse_loadable_list(attr)?;

    let string_option = |name: &str| -> syn::Result<Option<String>> {
        match parsed.get(name) {
            Some(MetaValue::Str(s)) => Ok(Some(s.clone())),
            Some(MetaValue::Flag) => Err(syn::Error::new_spanned(
                attr,
                format!("`{}` needs a value: {} = \"...\"", name, name),
            )),
            None => Ok(None),
        }
    };

    for key in parsed.keys() {
        if !matches!(key.as_str(), "default" | "tag" | "key") {
            return Err(syn::Error::new_spanned(
                attr,
                format!("unknown field option `{}`, expected default, tag or key", key),
            ));
        }
    }

    let default = string_option("default")?.ok_or_else(|| {
        syn::Error::new_spanned(
            attr,
            "loadable fields must have a default value: #[loadable(default = \"...\")]",
        )
    })?;

    Ok(Some(FieldConfig {
        default,
        tag: string_option("tag")?,
        key: string_option("key")?,
    }))
}
