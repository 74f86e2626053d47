use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Ident, LitStr, Token};

/// Derive macro for the `ComponentClass` trait
///
/// Produces the static capability descriptor of a component class:
///
/// ```ignore
/// #[derive(ComponentClass, Default)]
/// #[component(name = "Sprite", render, events(PointerDown, PointerUp), requires("Transformable"))]
/// struct Sprite { /* ... */ }
/// ```
///
/// When `name` is omitted the struct name is used.
#[proc_macro_derive(ComponentClass, attributes(component))]
pub fn derive_component_class(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_component_class(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct ComponentAttributes {
    name: Option<LitStr>,
    render: bool,
    collider: bool,
    events: Vec<Ident>,
    requires: Vec<LitStr>,
}

fn parse_component_attributes(input: &DeriveInput) -> syn::Result<ComponentAttributes> {
    let mut attrs = ComponentAttributes::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("component") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                attrs.name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("render") {
                attrs.render = true;
                Ok(())
            } else if meta.path.is_ident("collider") {
                attrs.collider = true;
                Ok(())
            } else if meta.path.is_ident("events") {
                meta.parse_nested_meta(|event| {
                    let ident = event
                        .path
                        .get_ident()
                        .cloned()
                        .ok_or_else(|| event.error("expected a node event name"))?;
                    attrs.events.push(ident);
                    Ok(())
                })
            } else if meta.path.is_ident("requires") {
                let content;
                syn::parenthesized!(content in meta.input);
                let names = content.parse_terminated(|input| input.parse::<LitStr>(), Token![,])?;
                attrs.requires.extend(names);
                Ok(())
            } else {
                Err(meta.error("unsupported component attribute"))
            }
        })?;
    }

    Ok(attrs)
}

fn expand_component_class(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "component classes cannot be generic",
        ));
    }

    let attrs = parse_component_attributes(input)?;

    // Extract component name from attribute or use struct name
    let component_name = match &attrs.name {
        Some(lit) if lit.value().is_empty() => {
            return Err(syn::Error::new_spanned(lit, "component name must not be empty"));
        }
        Some(lit) => lit.value(),
        None => name.to_string(),
    };

    for required in &attrs.requires {
        if required.value() == component_name {
            return Err(syn::Error::new_spanned(
                required,
                "a component cannot require itself",
            ));
        }
    }

    let events = &attrs.events;
    let requires = &attrs.requires;
    let render = attrs.render;
    let collider = attrs.collider;

    Ok(quote! {
        impl ::arbor::component::ComponentClass for #name {
            fn descriptor() -> &'static ::arbor::component::ComponentDescriptor {
                static DESCRIPTOR: ::arbor::component::ComponentDescriptor =
                    ::arbor::component::ComponentDescriptor {
                        name: #component_name,
                        events: &[#(::arbor::event::NodeEventType::#events),*],
                        requires: &[#(#requires),*],
                        render: #render,
                        collider: #collider,
                    };
                &DESCRIPTOR
            }
        }
    })
}
