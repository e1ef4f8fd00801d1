use crate::parse::{ParsedScope, ScopeMode};
use quote::quote;
use syn::ItemFn;

pub fn generate(parsed: &ParsedScope, item: ItemFn) -> proc_macro2::TokenStream {
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item;

    let factory = &parsed.args.factory;
    let mode = match parsed.args.mode {
        ScopeMode::Read => quote!(lock_scope::LockMode::Read),
        ScopeMode::Write => quote!(lock_scope::LockMode::Write),
    };
    // Async functions are expected to name an AsyncLockScopeFactory.
    let await_acquire = if parsed.is_async {
        quote!(.await)
    } else {
        quote!()
    };

    quote! {
        #(#attrs)*
        #vis #sig {
            let _lock_scope = (#factory).create_scope(#mode) #await_acquire ?;
            #block
        }
    }
}
