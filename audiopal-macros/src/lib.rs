use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod feature_meta;
use feature_meta::{parse_extn_args, split_list};

/// Registers an extension feature with the `audiopal` router.
///
/// The type must implement `Default` and `crate::extn::ExtnFeature`.
///
/// ```ignore
/// #[derive(Default, RegisterFeature)]
/// #[extn(name = "fm", keys = "handle_fm", prefixes = "fm_")]
/// pub struct FmFeature { /* ... */ }
/// ```
#[proc_macro_derive(RegisterFeature, attributes(extn))]
pub fn derive_register_feature(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match parse_extn_args(&input) {
        Ok(args) => args,
        Err(e) => return e.write_errors().into(),
    };

    let struct_name = &input.ident;
    let feature_name = &args.name;
    let keys = split_list(args.keys.as_ref());
    let prefixes = split_list(args.prefixes.as_ref());

    if keys.is_empty() && prefixes.is_empty() {
        return syn::Error::new_spanned(
            struct_name,
            "extension feature must own at least one key or prefix",
        )
        .to_compile_error()
        .into();
    }

    let lower = struct_name.to_string().to_lowercase();

    let mod_name = syn::Ident::new(
        &format!("__extn_registration_{}", lower),
        struct_name.span(),
    );

    let describe_fn_name = syn::Ident::new(
        &format!("describe_{}", lower),
        struct_name.span(),
    );

    let expanded = quote! {
        mod #mod_name {
            use super::*;

            fn #describe_fn_name() -> crate::extn::FeatureDescriptor {
                crate::extn::FeatureDescriptor {
                    name: #feature_name,
                    keys: &[#(#keys),*],
                    prefixes: &[#(#prefixes),*],
                    factory: || Box::new(#struct_name::default()),
                }
            }

            ::inventory::submit! {
                crate::extn::FeatureRegistration(#describe_fn_name)
            }
        }
    };

    TokenStream::from(expanded)
}
