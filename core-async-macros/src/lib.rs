//! Attribute macros backing `#[core_async::test]` and `#[core_async::main]`.
//!
//! Both wrap an `async fn` body in `core_async::runtime::block_on`, so test
//! and binary crates only depend on `core-async`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, ItemFn};

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, EntryKind::Test)
}

#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, EntryKind::Main)
}

enum EntryKind {
    Test,
    Main,
}

fn expand(attr: TokenStream, item: TokenStream, kind: EntryKind) -> TokenStream {
    if !attr.is_empty() {
        let tokens = TokenStream2::from(attr);
        return syn::Error::new_spanned(tokens, "core_async entry macros take no arguments")
            .to_compile_error()
            .into();
    }

    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "core_async entry macros require an `async fn`",
        )
        .to_compile_error()
        .into();
    }

    let mut sig = input.sig;
    sig.asyncness = None;

    let attrs = input.attrs;
    let vis = input.vis;
    let body = input.block;

    let test_attr = match kind {
        EntryKind::Test => quote!(#[test]),
        EntryKind::Main => TokenStream2::new(),
    };

    quote! {
        #(#attrs)*
        #test_attr
        #vis #sig {
            core_async::runtime::block_on(async move #body)
        }
    }
    .into()
}
