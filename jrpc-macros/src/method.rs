//! `#[rpc_method]` expansion
//!
//! Input:
//! ```ignore
//! #[rpc_method(defaults(c = 0))]
//! async fn sum(a: i64, b: Option<i64>, c: i64) -> Result<i64> {
//!     Ok(a + b.unwrap_or(0) + c)
//! }
//! ```
//!
//! Generated output:
//! ```ignore
//! fn sum() -> ::jrpc_server::MethodDef {
//!     async fn __rpc_inner(a: i64, b: Option<i64>, c: i64) -> Result<i64> {
//!         Ok(a + b.unwrap_or(0) + c)
//!     }
//!
//!     ::jrpc_server::MethodDef::new(
//!         "sum",
//!         ::jrpc_server::from_typed_fn(|(__arg0, __arg1, __arg2): (i64, Option<i64>, i64)| {
//!             __rpc_inner(__arg0, __arg1, __arg2)
//!         }),
//!     )
//!     .param(::jrpc_server::ParameterSpec::required("a").with_type("i64"))
//!     .param(::jrpc_server::ParameterSpec::optional("b", ::jrpc_server::Value::Null).with_type("i64"))
//!     .param(::jrpc_server::ParameterSpec::optional("c", 0).with_type("i64"))
//! }
//! ```

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    Attribute, Expr, FnArg, GenericArgument, Ident, ItemFn, LitStr, Pat, PathArguments,
    ReturnType, Type,
};

/// Properties accepted inside `#[rpc_method(...)]`
#[derive(Default)]
struct MethodArgs {
    name: Option<LitStr>,
    description: Option<LitStr>,
    returns: Option<LitStr>,
    private: bool,
    defaults: Vec<(Ident, Expr)>,
}

impl MethodArgs {
    fn parse(attr: TokenStream) -> syn::Result<Self> {
        let mut args = MethodArgs::default();

        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("name") {
                args.name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("description") {
                args.description = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("returns") {
                args.returns = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("private") {
                args.private = true;
                Ok(())
            } else if meta.path.is_ident("defaults") {
                meta.parse_nested_meta(|default| {
                    let ident = default
                        .path
                        .get_ident()
                        .cloned()
                        .ok_or_else(|| default.error("expected a parameter name"))?;
                    let value: Expr = default.value()?.parse()?;
                    args.defaults.push((ident, value));
                    Ok(())
                })
            } else {
                Err(meta.error("unsupported rpc_method property"))
            }
        });

        syn::parse::Parser::parse2(parser, attr)?;
        Ok(args)
    }

    fn default_for(&self, name: &Ident) -> Option<&Expr> {
        self.defaults
            .iter()
            .find(|(ident, _)| ident == name)
            .map(|(_, value)| value)
    }
}

/// One declared argument of the annotated function
struct Argument {
    name: Ident,
    ty: Type,
    /// `T` when the argument is `Option<T>`
    optional_inner: Option<Type>,
}

pub fn expand(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let args = MethodArgs::parse(attr)?;
    let input_fn: ItemFn = syn::parse2(item)?;

    let sig = &input_fn.sig;
    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(sig.fn_token, "rpc_method requires an async fn"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&sig.generics, "rpc_method functions cannot be generic"));
    }
    let return_type = match &sig.output {
        ReturnType::Type(_, ty) => ty,
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                sig,
                "rpc_method functions must return jrpc_core::Result<T>",
            ))
        }
    };

    let arguments = sig
        .inputs
        .iter()
        .map(argument)
        .collect::<syn::Result<Vec<_>>>()?;

    for (ident, _) in &args.defaults {
        if !arguments.iter().any(|arg| &arg.name == ident) {
            return Err(syn::Error::new_spanned(ident, "no argument with this name"));
        }
    }

    let fn_name = &sig.ident;
    let fn_vis = &input_fn.vis;
    let fn_block = &input_fn.block;
    let fn_attrs = &input_fn.attrs;

    let method_name = args
        .name
        .clone()
        .unwrap_or_else(|| LitStr::new(&fn_name.to_string(), fn_name.span()));

    let inner_params = arguments.iter().map(|arg| {
        let name = &arg.name;
        let ty = &arg.ty;
        quote! { #name: #ty }
    });
    let bindings: Vec<Ident> = (0..arguments.len())
        .map(|index| format_ident!("__arg{}", index))
        .collect();
    let types: Vec<&Type> = arguments.iter().map(|arg| &arg.ty).collect();

    // A one-element tuple needs its trailing comma
    let (pattern, tuple_type) = match bindings.len() {
        0 => (quote! { () }, quote! { () }),
        1 => {
            let binding = &bindings[0];
            let ty = types[0];
            (quote! { (#binding,) }, quote! { (#ty,) })
        }
        _ => (quote! { (#(#bindings),*) }, quote! { (#(#types),*) }),
    };

    let params = arguments.iter().map(|arg| parameter_spec(arg, &args));

    let description = args
        .description
        .clone()
        .or_else(|| doc_description(fn_attrs))
        .map(|text| quote! { .description(#text) });
    let returns = args.returns.as_ref().map(|type_name| {
        quote! { .returns(::jrpc_server::ReturnSpec::new().with_type(#type_name)) }
    });
    let private = args.private.then(|| quote! { .private() });

    Ok(quote! {
        #(#fn_attrs)*
        #fn_vis fn #fn_name() -> ::jrpc_server::MethodDef {
            async fn __rpc_inner(#(#inner_params),*) -> #return_type #fn_block

            ::jrpc_server::MethodDef::new(
                #method_name,
                ::jrpc_server::from_typed_fn(|#pattern: #tuple_type| __rpc_inner(#(#bindings),*)),
            )
            #(#params)*
            #description
            #returns
            #private
        }
    })
}

fn argument(input: &FnArg) -> syn::Result<Argument> {
    let pat_type = match input {
        FnArg::Typed(pat_type) => pat_type,
        FnArg::Receiver(receiver) => {
            return Err(syn::Error::new_spanned(
                receiver,
                "rpc_method functions cannot take self",
            ))
        }
    };

    let name = match pat_type.pat.as_ref() {
        Pat::Ident(pat) => pat.ident.clone(),
        other => {
            return Err(syn::Error::new_spanned(
                other,
                "rpc_method arguments must be plain identifiers",
            ))
        }
    };

    let ty = pat_type.ty.as_ref().clone();
    let optional_inner = option_inner(&ty).cloned();

    Ok(Argument {
        name,
        ty,
        optional_inner,
    })
}

fn parameter_spec(arg: &Argument, args: &MethodArgs) -> TokenStream {
    let name = LitStr::new(&arg.name.to_string(), arg.name.span());
    let type_name = type_name(arg.optional_inner.as_ref().unwrap_or(&arg.ty));

    let spec = match (args.default_for(&arg.name), &arg.optional_inner) {
        (Some(value), _) => quote! { ::jrpc_server::ParameterSpec::optional(#name, #value) },
        (None, Some(_)) => {
            quote! { ::jrpc_server::ParameterSpec::optional(#name, ::jrpc_server::Value::Null) }
        }
        (None, None) => quote! { ::jrpc_server::ParameterSpec::required(#name) },
    };

    quote! { .param(#spec.with_type(#type_name)) }
}

/// The `T` of an `Option<T>` type, if it is one
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(generics) if generics.args.len() == 1 => {
            match generics.args.first() {
                Some(GenericArgument::Type(inner)) => Some(inner),
                _ => None,
            }
        }
        _ => None,
    }
}

fn type_name(ty: &Type) -> LitStr {
    let rendered: String = quote!(#ty)
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    LitStr::new(&rendered, Span::call_site())
}

/// First paragraph of the doc comment
fn doc_description(attrs: &[Attribute]) -> Option<LitStr> {
    let mut lines = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("doc")) {
        if let syn::Meta::NameValue(meta) = &attr.meta {
            if let Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(text),
                ..
            }) = &meta.value
            {
                let line = text.value().trim().to_string();
                if line.is_empty() {
                    if !lines.is_empty() {
                        break;
                    }
                    continue;
                }
                lines.push(line);
            }
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(LitStr::new(&lines.join(" "), Span::call_site()))
    }
}
