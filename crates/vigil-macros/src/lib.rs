//! Procedural macros for Vigil
//!
//! This crate provides `#[derive(Constrained)]`, which turns `#[validate(...)]`
//! attributes into a `vigil_validate::Constrained` implementation:
//!
//! - `#[validate(not_blank, size(min = 2, max = 50))]` - constraints on a field
//! - `#[validate(min(value = 18), message = "...")]` - message override
//! - `#[validate(nested)]` - cascade into a nested object
//! - `#[validate(each_nested)]` - cascade into each element of a container
//! - `#[validate(each(not_blank))]` - constraints on each element
//!
//! The same attribute on the struct declares type-level constraints.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{quote, ToTokens};
use syn::meta::ParseNestedMeta;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DeriveInput, Expr, GenericParam, LitStr,
    Member,
};

/// Derive constraint metadata from `#[validate(...)]` attributes.
///
/// # Example
///
/// ```rust,ignore
/// use vigil_validate::prelude::*;
///
/// #[derive(Constrained)]
/// struct CreateUser {
///     #[validate(email)]
///     email: String,
///
///     #[validate(not_blank, size(min = 3, max = 50))]
///     username: String,
///
///     #[validate(range(min = 18, max = 120), message = "Age must be between {min} and {max}")]
///     age: u8,
///
///     #[validate(each_nested, each(not_null))]
///     addresses: Vec<Address>,
/// }
/// ```
#[proc_macro_derive(Constrained, attributes(validate))]
pub fn derive_constrained(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

/// One `kind(param = value, ...)` entry.
struct Declaration {
    kind: String,
    params: Vec<(String, Expr)>,
    message: Option<LitStr>,
}

impl ToTokens for Declaration {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let kind = &self.kind;
        let params = self.params.iter().map(|(name, value)| quote!(.param(#name, #value)));
        let message = self.message.iter().map(|m| quote!(.message(#m)));
        tokens.extend(quote! {
            ::vigil_validate::ConstraintDeclaration::new(#kind) #(#params)* #(#message)*
        });
    }
}

/// Everything collected from the `#[validate]` attributes of one item.
#[derive(Default)]
struct Declarations {
    constraints: Vec<Declaration>,
    element_constraints: Vec<Declaration>,
    nested: bool,
    each_nested: bool,
}

impl Declarations {
    fn is_empty(&self) -> bool {
        self.constraints.is_empty()
            && self.element_constraints.is_empty()
            && !self.nested
            && !self.each_nested
    }
}

fn expand(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Constrained can only be derived for structs",
            ))
        }
    };

    let type_level = parse_attrs(&input.attrs)?;
    if type_level.nested || type_level.each_nested || !type_level.element_constraints.is_empty() {
        return Err(syn::Error::new(
            Span::call_site(),
            "`nested`, `each_nested` and `each(...)` apply to fields, not to the struct",
        ));
    }
    let type_constraints = &type_level.constraints;

    let mut members = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let declared = parse_attrs(&field.attrs)?;
        if declared.is_empty() {
            continue;
        }

        let (member, member_name) = match &field.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
            None => (Member::Unnamed(index.into()), index.to_string()),
        };
        let constraints = &declared.constraints;
        let element_constraints = &declared.element_constraints;
        let cascade = declared.nested.then(|| quote!(.cascade()));
        let cascade_elements = declared.each_nested.then(|| quote!(.cascade_elements()));

        members.push(quote! {
            .member(
                ::vigil_validate::MemberSchema::<Self>::new(
                    #member_name,
                    |target: &Self| ::vigil_validate::AsValue::as_value(&target.#member),
                )
                #(.constraint(#constraints))*
                #(.element_constraint(#element_constraints))*
                #cascade
                #cascade_elements
            )
        });
    }

    // Metadata is shared between threads and cached by `TypeId`.
    for param in input.generics.params.iter_mut() {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::vigil_validate::AsValue));
            ty.bounds.push(parse_quote!(::std::marker::Send));
            ty.bounds.push(parse_quote!(::std::marker::Sync));
            ty.bounds.push(parse_quote!('static));
        }
    }
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::vigil_validate::Constrained for #name #ty_generics #where_clause {
            fn declare(
                schema: ::vigil_validate::Schema<Self>,
            ) -> ::vigil_validate::Schema<Self> {
                schema
                    #(.constraint(#type_constraints))*
                    #(#members)*
            }
        }

        impl #impl_generics ::vigil_validate::AsValue for #name #ty_generics #where_clause {
            fn as_value(&self) -> ::vigil_validate::Value<'_> {
                ::vigil_validate::Value::Object(self)
            }
        }
    })
}

fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Declarations> {
    let mut declarations = Declarations::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("validate")) {
        let mut constraints = Vec::new();
        let mut elements = Vec::new();
        let mut message = None;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("nested") {
                declarations.nested = true;
            } else if meta.path.is_ident("each_nested") {
                declarations.each_nested = true;
            } else if meta.path.is_ident("message") {
                message = Some(meta.value()?.parse::<LitStr>()?);
            } else if meta.path.is_ident("each") {
                elements.extend(parse_each(&meta)?);
            } else {
                constraints.push(parse_declaration(&meta)?);
            }
            Ok(())
        })?;

        // A message applies to every constraint of its own attribute.
        for declaration in &mut constraints {
            if declaration.message.is_none() {
                declaration.message = message.clone();
            }
        }
        declarations.constraints.extend(constraints);
        declarations.element_constraints.extend(elements);
    }
    Ok(declarations)
}

/// `each(kind, kind(...), message = "...")`
fn parse_each(meta: &ParseNestedMeta) -> syn::Result<Vec<Declaration>> {
    let mut constraints = Vec::new();
    let mut message = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("message") {
            message = Some(inner.value()?.parse::<LitStr>()?);
        } else {
            constraints.push(parse_declaration(&inner)?);
        }
        Ok(())
    })?;
    for declaration in &mut constraints {
        if declaration.message.is_none() {
            declaration.message = message.clone();
        }
    }
    Ok(constraints)
}

/// `kind` or `kind(param = value, ...)`
fn parse_declaration(meta: &ParseNestedMeta) -> syn::Result<Declaration> {
    let kind = meta
        .path
        .get_ident()
        .map(ToString::to_string)
        .ok_or_else(|| meta.error("expected a constraint kind name"))?;
    let mut declaration = Declaration {
        kind,
        params: Vec::new(),
        message: None,
    };

    if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|arg| {
            let name = arg
                .path
                .get_ident()
                .map(ToString::to_string)
                .ok_or_else(|| arg.error("expected a parameter name"))?;
            let value: Expr = arg.value()?.parse()?;
            if name == "message" {
                match value {
                    Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit),
                        ..
                    }) => declaration.message = Some(lit),
                    other => {
                        return Err(syn::Error::new_spanned(other, "message must be a string literal"))
                    }
                }
            } else {
                declaration.params.push((name, value));
            }
            Ok(())
        })?;
    } else if meta.input.peek(syn::Token![=]) {
        return Err(meta.error(format!(
            "use `{}(param = value)` to pass parameters",
            declaration.kind
        )));
    }

    Ok(declaration)
}
