//! Implementation of `#[interface]`.

use proc_macro::TokenStream;
use proc_macro2::{Group, Ident, Span, TokenStream as TokenStream2, TokenTree};
use quote::{format_ident, quote};
use syn::{
    FnArg, GenericArgument, ItemTrait, LitStr, PathArguments, ReturnType, Signature, Token,
    TraitBoundModifier, TraitItem, TraitItemFn, Type, TypeParamBound,
    parse::{Parse, ParseStream},
    parse_macro_input, parse_quote,
    punctuated::Punctuated,
};

/// Arguments for the `#[interface]` macro.
pub(crate) struct InterfaceArgs {
    pub name: Option<String>,
}

impl Parse for InterfaceArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut name = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "name" => {
                    let lit: LitStr = input.parse()?;
                    name = Some(lit.value());
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(InterfaceArgs { name })
    }
}

/// A method of the annotated trait, as the generated code needs it.
struct Method {
    ident: Ident,
    params: Vec<Type>,
    output: Option<Type>,
    fallible: bool,
    helper: Option<Ident>,
}

/// Implementation of the `#[interface]` attribute macro.
pub fn interface_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as InterfaceArgs);
    let input = parse_macro_input!(item as ItemTrait);

    match expand(args, input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: InterfaceArgs, mut input: ItemTrait) -> syn::Result<TokenStream2> {
    validate_trait(&input)?;

    let trait_name = input.ident.clone();
    let display_name = args.name.unwrap_or_else(|| trait_name.to_string());

    let supers = interface_supertraits(&input.supertraits);
    add_marker_bounds(&mut input);

    let mut methods = Vec::new();
    let mut helpers = Vec::new();
    for item in &mut input.items {
        let func = match item {
            TraitItem::Fn(func) => func,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "interface traits may only contain methods",
                ));
            }
        };
        validate_method(&func.sig)?;
        let (method, helper) = lower_method(&trait_name, func)?;
        methods.push(method);
        helpers.extend(helper);
    }

    let descriptor = descriptor_impl(&trait_name, &display_name, &supers, &methods);
    let upcast = upcast_impl(&trait_name, &supers);
    let composite = composite_impl(&trait_name, &methods);

    Ok(quote! {
        #input

        #(#helpers)*

        #descriptor

        #upcast

        #composite
    })
}

fn validate_trait(input: &ItemTrait) -> syn::Result<()> {
    if !input.generics.params.is_empty() || input.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "interface traits cannot be generic",
        ));
    }
    if let Some(unsafety) = &input.unsafety {
        return Err(syn::Error::new_spanned(
            unsafety,
            "interface traits cannot be unsafe",
        ));
    }
    if let Some(auto) = &input.auto_token {
        return Err(syn::Error::new_spanned(auto, "interface traits cannot be auto traits"));
    }
    for bound in &input.supertraits {
        let TypeParamBound::Trait(trait_bound) = bound else {
            continue;
        };
        if !matches!(trait_bound.modifier, TraitBoundModifier::None) {
            return Err(syn::Error::new_spanned(
                trait_bound,
                "interface supertraits cannot be `?Trait` bounds",
            ));
        }
        if let Some(segment) = trait_bound.path.segments.last() {
            if NON_INTERFACE_TRAITS.iter().any(|name| segment.ident == *name) {
                return Err(syn::Error::new_spanned(
                    trait_bound,
                    format!(
                        "`{}` is not an interface; supertraits must be `#[interface]` traits, `Send` or `Sync`",
                        segment.ident
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Standard traits that can never be routed as interfaces.
const NON_INTERFACE_TRAITS: &[&str] = &[
    "Any", "Clone", "Copy", "Debug", "Default", "Display", "Eq", "Hash", "Ord", "PartialEq",
    "PartialOrd", "Sized", "Unpin",
];

fn validate_method(sig: &Signature) -> syn::Result<()> {
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "interface methods cannot be async",
        ));
    }
    if let Some(unsafety) = &sig.unsafety {
        return Err(syn::Error::new_spanned(
            unsafety,
            "interface methods cannot be unsafe",
        ));
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "interface methods cannot be generic",
        ));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new_spanned(
            variadic,
            "interface methods cannot be variadic",
        ));
    }

    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some()
                && receiver.mutability.is_none()
                && receiver.colon_token.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                sig,
                "interface methods must take `&self`",
            ));
        }
    }

    for arg in sig.inputs.iter().skip(1) {
        if let FnArg::Typed(pat_type) = arg {
            check_owned(&pat_type.ty, "parameters")?;
        }
    }
    if let ReturnType::Type(_, ty) = &sig.output {
        check_owned(ty, "return types")?;
    }
    Ok(())
}

fn check_owned(ty: &Type, what: &str) -> syn::Result<()> {
    match ty {
        Type::Reference(_) => Err(syn::Error::new_spanned(
            ty,
            format!("interface method {} must be owned types", what),
        )),
        Type::ImplTrait(_) => Err(syn::Error::new_spanned(
            ty,
            format!("interface method {} cannot be `impl Trait`", what),
        )),
        _ => Ok(()),
    }
}

/// Supertraits naming other interfaces (everything but `Send`, `Sync` and lifetimes).
fn interface_supertraits(bounds: &Punctuated<TypeParamBound, Token![+]>) -> Vec<syn::Path> {
    bounds
        .iter()
        .filter_map(|bound| match bound {
            TypeParamBound::Trait(trait_bound) if !is_marker(&trait_bound.path) => {
                Some(trait_bound.path.clone())
            }
            _ => None,
        })
        .collect()
}

fn is_marker(path: &syn::Path) -> bool {
    path.segments
        .last()
        .is_some_and(|segment| segment.ident == "Send" || segment.ident == "Sync")
}

fn has_bound(bounds: &Punctuated<TypeParamBound, Token![+]>, name: &str) -> bool {
    bounds.iter().any(|bound| match bound {
        TypeParamBound::Trait(trait_bound) => trait_bound
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == name),
        _ => false,
    })
}

fn add_marker_bounds(input: &mut ItemTrait) {
    if !has_bound(&input.supertraits, "Send") {
        input.supertraits.push(parse_quote!(::core::marker::Send));
    }
    if !has_bound(&input.supertraits, "Sync") {
        input.supertraits.push(parse_quote!(::core::marker::Sync));
    }
    if input.colon_token.is_none() {
        input.colon_token = Some(Default::default());
    }
}

/// Collect what the generated code needs about `func`, moving its default
/// body (if any) into a hidden generic helper the composite can call.
fn lower_method(
    trait_name: &Ident,
    func: &mut TraitItemFn,
) -> syn::Result<(Method, Option<TokenStream2>)> {
    let ident = func.sig.ident.clone();
    let params: Vec<Type> = func
        .sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => Some((*pat_type.ty).clone()),
            FnArg::Receiver(_) => None,
        })
        .collect();
    let output = match &func.sig.output {
        ReturnType::Default => None,
        ReturnType::Type(_, ty) => Some((**ty).clone()),
    };
    let fallible = output.as_ref().is_some_and(is_result);

    let Some(block) = func.default.take() else {
        return Ok((
            Method {
                ident,
                params,
                output,
                fallible,
                helper: None,
            },
            None,
        ));
    };

    let helper_ident = format_ident!("__trellis_{}_{}", trait_name, ident);
    let helper_params: Vec<TokenStream2> = func
        .sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => {
                let pat = &pat_type.pat;
                let ty = &pat_type.ty;
                Some(quote! { #pat: #ty })
            }
            FnArg::Receiver(_) => None,
        })
        .collect();
    let ret = &func.sig.output;
    let body = rewrite_receiver(quote! { #block });

    let helper = quote! {
        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #helper_ident<__S: #trait_name + ?::core::marker::Sized>(
            __this: &__S,
            #(#helper_params),*
        ) #ret #body
    };

    // The trait keeps a default that forwards to the helper.
    let forward_args: Vec<Ident> = (0..params.len()).map(arg_ident).collect();
    for (index, arg) in func.sig.inputs.iter_mut().skip(1).enumerate() {
        if let FnArg::Typed(pat_type) = arg {
            let name = arg_ident(index);
            *pat_type.pat = parse_quote!(#name);
        }
    }
    func.default = Some(parse_quote!({
        #helper_ident(self, #(#forward_args),*)
    }));

    Ok((
        Method {
            ident,
            params,
            output,
            fallible,
            helper: Some(helper_ident),
        },
        Some(helper),
    ))
}

fn arg_ident(index: usize) -> Ident {
    format_ident!("__arg{}", index)
}

fn is_result(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Result"),
        _ => false,
    }
}

/// The `dyn Trait` of an `Arc<dyn Trait>` return type.
fn shared_object(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    let PathArguments::AngleBracketed(generics) = &segment.arguments else {
        return None;
    };
    match generics.args.first() {
        Some(GenericArgument::Type(object @ Type::TraitObject(trait_object)))
            if generics.args.len() == 1 && trait_object.bounds.len() == 1 =>
        {
            Some(object)
        }
        _ => None,
    }
}

/// Replace `self` with `__this` and `Self` with `__S` throughout a body.
fn rewrite_receiver(tokens: TokenStream2) -> TokenStream2 {
    tokens
        .into_iter()
        .map(|tree| match tree {
            TokenTree::Ident(ident) if ident == "self" => {
                TokenTree::Ident(Ident::new("__this", ident.span()))
            }
            TokenTree::Ident(ident) if ident == "Self" => {
                TokenTree::Ident(Ident::new("__S", ident.span()))
            }
            TokenTree::Group(group) => {
                let mut rewritten = Group::new(group.delimiter(), rewrite_receiver(group.stream()));
                rewritten.set_span(group.span());
                TokenTree::Group(rewritten)
            }
            other => other,
        })
        .collect()
}

/// Statements unpacking `__args` into `__arg0..`.
fn take_args(params: &[Type]) -> Vec<TokenStream2> {
    params
        .iter()
        .enumerate()
        .map(|(index, ty)| {
            let name = arg_ident(index);
            quote! { let #name: #ty = __args.take()?; }
        })
        .collect()
}

fn outcome(method: &Method, call: TokenStream2) -> TokenStream2 {
    if method.fallible {
        quote! { ::trellis::Outcome::from_result(#call) }
    } else {
        quote! { ::trellis::Outcome::returned(#call) }
    }
}

fn descriptor_impl(
    trait_name: &Ident,
    display_name: &str,
    supers: &[syn::Path],
    methods: &[Method],
) -> TokenStream2 {
    let method_descriptors = methods.iter().map(|method| {
        let ident = &method.ident;
        let name = LitStr::new(&ident.to_string(), Span::call_site());
        let params = &method.params;
        let args_mut = if params.is_empty() {
            quote! {}
        } else {
            quote! { mut }
        };
        let takes = take_args(params);
        let arg_names: Vec<Ident> = (0..params.len()).map(arg_ident).collect();

        let invoked = outcome(
            method,
            quote! { <dyn #trait_name as #trait_name>::#ident(&**__this, #(#arg_names),*) },
        );

        let returns = method.output.as_ref().map(|ty| quote! { .returns::<#ty>() });
        let fallible = method.fallible.then(|| quote! { .fallible() });
        let default_body = method.helper.as_ref().map(|helper| {
            let takes = take_args(params);
            let ran = outcome(method, quote! { #helper(__composite, #(#arg_names),*) });
            quote! {
                .default_body(|__composite, #args_mut __args| {
                    #(#takes)*
                    __args.finish()?;
                    ::core::result::Result::Ok(#ran)
                })
            }
        });

        quote! {
            .method(
                ::trellis::MethodDescriptor::builder::<dyn #trait_name>(#name, |__target, #args_mut __args| {
                    let __this = __target
                        .capability::<dyn #trait_name>()
                        .ok_or(::trellis::InvokeError::Unsupported)?;
                    #(#takes)*
                    __args.finish()?;
                    ::core::result::Result::Ok(#invoked)
                })
                #(.param::<#params>())*
                #returns
                #fallible
                #default_body
                .build()
            )
        }
    });

    quote! {
        impl ::trellis::Interface for dyn #trait_name {
            const NAME: &'static str = #display_name;

            fn descriptor() -> &'static ::trellis::InterfaceDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<::trellis::InterfaceDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    ::trellis::InterfaceDescriptor::builder::<dyn #trait_name>(#display_name)
                        #(.extends(<dyn #supers as ::trellis::Interface>::descriptor()))*
                        #(#method_descriptors)*
                        .build()
                })
            }
        }
    }
}

fn upcast_impl(trait_name: &Ident, supers: &[syn::Path]) -> TokenStream2 {
    quote! {
        impl<__T: #trait_name + 'static> ::trellis::Upcast<__T> for dyn #trait_name {
            fn upcast(value: ::std::sync::Arc<__T>) -> ::std::sync::Arc<Self> {
                value
            }

            fn register(
                value: &::std::sync::Arc<__T>,
                capabilities: &mut ::trellis::Capabilities,
            ) {
                let view: ::std::sync::Arc<__T> = ::std::sync::Arc::clone(value);
                capabilities.insert::<dyn #trait_name>(view);
                #(<dyn #supers as ::trellis::Upcast<__T>>::register(value, capabilities);)*
            }
        }
    }
}

fn composite_impl(trait_name: &Ident, methods: &[Method]) -> TokenStream2 {
    let overrides = methods.iter().enumerate().map(|(index, method)| {
        let ident = &method.ident;
        let params = &method.params;
        let arg_names: Vec<Ident> = (0..params.len()).map(arg_ident).collect();
        let ret = match &method.output {
            Some(ty) => quote! { #ty },
            None => quote! { () },
        };
        let entry = match method.output.as_ref().and_then(shared_object) {
            Some(object) => quote! { invoke_view::<#object> },
            None => quote! { invoke::<#ret> },
        };

        quote! {
            fn #ident(&self, #(#arg_names: #params),*) -> #ret {
                self.#entry(
                    <dyn #trait_name as ::trellis::Interface>::descriptor().method(#index),
                    ::trellis::Args::new()#(.with(#arg_names))*,
                )
            }
        }
    });

    quote! {
        impl #trait_name for ::trellis::Composite {
            #(#overrides)*
        }
    }
}
