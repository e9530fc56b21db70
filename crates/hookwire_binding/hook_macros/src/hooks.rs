//! Code generation for `#[hooks]` on impl blocks.

use hookwire_macro_utils::{HookwireCrate, last_segment_ident, resolve_crate_path};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{FnArg, ImplItem, ImplItemFn, ItemImpl, Pat, Type};

use crate::args::{self, HooksArgs, MethodMarkers, ParamMarker};

/// Name of the context type a hook method's context parameter must have.
const CONTEXT_IDENT: &str = "CallContext";

/// Generates the cleaned impl block plus a `HookDefinition` impl.
pub(crate) fn generate_hooks(args: &HooksArgs, input: &ItemImpl) -> TokenStream {
    match expand(args, input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(args: &HooksArgs, input: &ItemImpl) -> syn::Result<TokenStream> {
    let hb = resolve_crate_path(HookwireCrate::Binding);

    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[hooks] must be applied to an inherent impl block",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[hooks] does not support generic impl blocks",
        ));
    }

    let self_ty = &input.self_ty;

    let mut declared = Vec::new();
    for item in &input.items {
        if let ImplItem::Fn(method) = item {
            let markers = MethodMarkers::parse(&method.attrs)?;
            if markers.is_hook() {
                declared.push(declared_method(&hb, self_ty, method, &markers)?);
            } else if markers.has_any() {
                return Err(syn::Error::new_spanned(
                    &method.sig.ident,
                    "#[return_type] and #[one_shot] need an intent marker such as #[before_method]",
                ));
            }
        }
    }

    let cleaned_items: Vec<_> = input
        .items
        .iter()
        .map(|item| match item {
            ImplItem::Fn(method) => ImplItem::Fn(strip_markers(method)),
            other => other.clone(),
        })
        .collect();

    let target = match &args.target {
        Some(target) => quote! { #hb::TargetSpec::new(#target) },
        None => quote! { #hb::TargetSpec::no_op() },
    };
    let loader = args
        .loader
        .as_ref()
        .map(|loader| quote! { .with_loader(#loader) });

    let name_fn = args.name.as_ref().map(|name| {
        quote! {
            fn name(&self) -> ::std::string::String {
                ::std::string::String::from(#name)
            }
        }
    });

    let all_methods_fn = args.all_methods.then(|| {
        quote! {
            fn all_methods(
                self: ::std::sync::Arc<Self>,
            ) -> ::core::option::Option<::std::sync::Arc<dyn #hb::AllMethodsHook>> {
                ::core::option::Option::Some(self)
            }
        }
    });
    let all_constructors_fn = args.all_constructors.then(|| {
        quote! {
            fn all_constructors(
                self: ::std::sync::Arc<Self>,
            ) -> ::core::option::Option<::std::sync::Arc<dyn #hb::AllConstructorsHook>> {
                ::core::option::Option::Some(self)
            }
        }
    });

    let attrs = &input.attrs;

    Ok(quote! {
        #(#attrs)*
        impl #self_ty {
            #(#cleaned_items)*
        }

        impl #hb::HookDefinition for #self_ty {
            #name_fn

            fn target(&self) -> #hb::TargetSpec {
                #target #loader
            }

            fn declared_methods(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<#hb::DeclaredMethod> {
                ::std::vec![
                    #(#declared),*
                ]
            }

            #all_methods_fn
            #all_constructors_fn
        }
    })
}

/// Builds the `DeclaredMethod` expression for one marked method.
fn declared_method(
    hb: &TokenStream,
    self_ty: &Type,
    method: &ImplItemFn,
    markers: &MethodMarkers,
) -> syn::Result<TokenStream> {
    let sig = &method.sig;
    let ident = &sig.ident;
    let name = ident.to_string();

    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "hook methods run inside the intercepted call and cannot be async",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "hook methods cannot have generic parameters",
        ));
    }

    let mut has_receiver = false;
    let mut params = Vec::new();
    let mut extractions = Vec::new();
    let mut call_args = Vec::new();
    let mut arg_index = 0_usize;

    for input in &sig.inputs {
        match input {
            FnArg::Receiver(receiver) => {
                if receiver.reference.is_none() || receiver.mutability.is_some() {
                    return Err(syn::Error::new_spanned(
                        receiver,
                        "hook methods must take `&self`; the definition is shared behind an Arc",
                    ));
                }
                has_receiver = true;
            }
            FnArg::Typed(pat_type) => {
                let markers = args::parse_param_markers(&pat_type.attrs)?;
                let ty = &*pat_type.ty;

                if is_context(ty) {
                    if !markers.is_empty() {
                        return Err(syn::Error::new_spanned(
                            pat_type,
                            "the context parameter cannot carry #[param] or #[placeholder]",
                        ));
                    }
                    params.push(quote! { .param(#hb::CONTEXT_TYPE) });
                    call_args.push(quote! { __ctx });
                    continue;
                }

                if let Type::Reference(reference) = ty {
                    return Err(syn::Error::new_spanned(
                        reference,
                        "hook method arguments must be owned types implementing HookParam",
                    ));
                }

                let annotations = markers.iter().map(|marker| match marker {
                    ParamMarker::Override(Some(name)) => {
                        quote! { #hb::ParamAnnotation::named(#name) }
                    }
                    ParamMarker::Override(None) => quote! { #hb::ParamAnnotation::any() },
                    ParamMarker::Placeholder => quote! { #hb::ParamAnnotation::Placeholder },
                });
                params.push(quote! {
                    .annotated_param(
                        <#ty as #hb::HookParam>::type_name(),
                        ::std::vec![#(#annotations),*],
                    )
                });

                let binding = match &*pat_type.pat {
                    Pat::Ident(pat_ident) => pat_ident.ident.clone(),
                    _ => format_ident!("__arg{}", arg_index),
                };
                let local = format_ident!("__{}", binding, span = pat_type.span());
                extractions.push(quote! {
                    let #local = <#ty as #hb::HookParam>::extract(__args, #arg_index)?;
                });
                call_args.push(quote! { #local });
                arg_index += 1;
            }
        }
    }

    let call = if has_receiver {
        quote! { __hooks.#ident(#(#call_args),*) }
    } else {
        quote! { <#self_ty>::#ident(#(#call_args),*) }
    };
    let capture = has_receiver.then(|| quote! { let __hooks = ::std::sync::Arc::clone(&self); });

    let intents = markers.intents.iter().map(|(variant, names)| {
        let variant = format_ident!("{}", variant);
        let count = names.len();
        quote! {
            .intent(#hb::Intent::#variant, {
                let __names: [&'static str; #count] = [#(#names),*];
                __names
            })
        }
    });
    let return_type = markers
        .return_type
        .as_ref()
        .map(|ty| quote! { .return_type(#ty) });
    let one_shot = markers.one_shot.then(|| quote! { .one_shot() });

    Ok(quote! {
        {
            #capture
            #hb::DeclaredMethod::new(
                #name,
                move |__ctx: &mut #hb::CallContext, __args: &[#hb::Value]| {
                    #(#extractions)*
                    #hb::IntoHookResult::into_hook_result(#call)
                },
            )
            #(#params)*
            #(#intents)*
            #return_type
            #one_shot
        }
    })
}

/// Returns `true` if `ty` names the call context.
fn is_context(ty: &Type) -> bool {
    matches!(ty, Type::Reference(_)) && last_segment_ident(ty).is_some_and(|i| i == CONTEXT_IDENT)
}

/// Removes the markers this macro consumed.
fn strip_markers(method: &ImplItemFn) -> ImplItemFn {
    let mut cleaned = method.clone();
    cleaned.attrs.retain(|attr| !args::is_method_marker(attr));
    for input in &mut cleaned.sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            pat_type.attrs.retain(|attr| !args::is_param_marker(attr));
        }
    }
    cleaned
}
