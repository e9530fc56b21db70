//! Parsing of `#[hooks(...)]` arguments and of the method and parameter
//! markers inside the impl block.

use darling::FromMeta;
use darling::ast::NestedMeta;
use proc_macro2::TokenStream;
use syn::punctuated::Punctuated;
use syn::{Attribute, LitStr, Meta, Token};

/// Arguments of the `#[hooks]` attribute.
#[derive(Debug, FromMeta)]
pub(crate) struct HooksArgs {
    /// Target type name. Absent means the no-op type.
    pub target: Option<String>,

    /// Loader to resolve the target through.
    pub loader: Option<String>,

    /// Definition name for diagnostics.
    pub name: Option<String>,

    #[darling(default)]
    pub all_methods: bool,

    #[darling(default)]
    pub all_constructors: bool,
}

impl HooksArgs {
    pub(crate) fn parse(tokens: TokenStream) -> darling::Result<Self> {
        let items = NestedMeta::parse_meta_list(tokens)?;
        Self::from_list(&items)
    }
}

/// Intent marker names, paired with the `Intent` variant they produce.
pub(crate) const INTENT_MARKERS: [(&str, &str); 6] = [
    ("before_method", "BeforeMethod"),
    ("after_method", "AfterMethod"),
    ("replace_method", "ReplaceMethod"),
    ("before_constructor", "BeforeConstructor"),
    ("after_constructor", "AfterConstructor"),
    ("replace_constructor", "ReplaceConstructor"),
];

const RETURN_TYPE: &str = "return_type";
const ONE_SHOT: &str = "one_shot";
const PARAM: &str = "param";
const PLACEHOLDER: &str = "placeholder";

/// Hook metadata collected from one method's attributes.
#[derive(Debug, Default)]
pub(crate) struct MethodMarkers {
    /// `(variant, names)` per intent marker, in declaration order.
    pub intents: Vec<(&'static str, Vec<LitStr>)>,
    pub return_type: Option<LitStr>,
    pub one_shot: bool,
}

impl MethodMarkers {
    /// Collects the markers on a method.
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut markers = Self::default();

        for attr in attrs {
            let path = attr.path();
            if let Some((_, variant)) = INTENT_MARKERS.iter().find(|(m, _)| path.is_ident(m)) {
                markers.intents.push((*variant, parse_names(attr)?));
            } else if path.is_ident(RETURN_TYPE) {
                if markers.return_type.is_some() {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "#[return_type] may appear only once per method",
                    ));
                }
                markers.return_type = Some(attr.parse_args::<LitStr>()?);
            } else if path.is_ident(ONE_SHOT) {
                attr.meta.require_path_only()?;
                markers.one_shot = true;
            }
        }

        Ok(markers)
    }

    /// Returns `true` if the method carries at least one intent marker.
    pub(crate) fn is_hook(&self) -> bool {
        !self.intents.is_empty()
    }

    /// Returns `true` if any hook-only marker is present.
    pub(crate) fn has_any(&self) -> bool {
        self.is_hook() || self.return_type.is_some() || self.one_shot
    }
}

/// Parses `#[marker]` or `#[marker("a", "b")]`.
fn parse_names(attr: &Attribute) -> syn::Result<Vec<LitStr>> {
    match &attr.meta {
        Meta::Path(_) => Ok(Vec::new()),
        Meta::List(list) => Ok(list
            .parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?
            .into_iter()
            .collect()),
        Meta::NameValue(_) => Err(syn::Error::new_spanned(
            attr,
            "expected a list of member names, e.g. #[before_method(\"name\")]",
        )),
    }
}

/// One parameter marker.
#[derive(Debug, Clone)]
pub(crate) enum ParamMarker {
    /// `#[param]` or `#[param("type")]`.
    Override(Option<LitStr>),
    /// `#[placeholder]`.
    Placeholder,
}

/// Collects the markers on a parameter.
pub(crate) fn parse_param_markers(attrs: &[Attribute]) -> syn::Result<Vec<ParamMarker>> {
    let mut markers = Vec::new();
    for attr in attrs {
        if attr.path().is_ident(PARAM) {
            let marker = match &attr.meta {
                Meta::Path(_) => ParamMarker::Override(None),
                _ => ParamMarker::Override(Some(attr.parse_args::<LitStr>()?)),
            };
            markers.push(marker);
        } else if attr.path().is_ident(PLACEHOLDER) {
            attr.meta.require_path_only()?;
            markers.push(ParamMarker::Placeholder);
        }
    }
    Ok(markers)
}

/// Returns `true` for attributes this macro consumes from methods.
pub(crate) fn is_method_marker(attr: &Attribute) -> bool {
    let path = attr.path();
    INTENT_MARKERS.iter().any(|(m, _)| path.is_ident(m))
        || path.is_ident(RETURN_TYPE)
        || path.is_ident(ONE_SHOT)
}

/// Returns `true` for attributes this macro consumes from parameters.
pub(crate) fn is_param_marker(attr: &Attribute) -> bool {
    attr.path().is_ident(PARAM) || attr.path().is_ident(PLACEHOLDER)
}
