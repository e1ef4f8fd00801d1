use syn::parse::{Parse, ParseStream};
use syn::{Expr, Ident, ItemFn, ReturnType, Token};

pub enum ScopeMode {
    Read,
    Write,
}

pub struct ScopeArgs {
    pub mode: ScopeMode,
    pub factory: Expr,
}

impl Parse for ScopeArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let usage = "usage: #[lock_scope(read, factory = <expr>)] or #[lock_scope(write, factory = <expr>)]";

        if input.is_empty() {
            return Err(input.error(usage));
        }

        let mode_ident: Ident = input.parse()?;
        let mode = match mode_ident.to_string().as_str() {
            "read" => ScopeMode::Read,
            "write" => ScopeMode::Write,
            _ => {
                return Err(syn::Error::new_spanned(
                    &mode_ident,
                    "lock_scope mode must be `read` or `write`",
                ));
            }
        };

        input.parse::<Token![,]>()?;

        let key: Ident = input.parse()?;
        if key != "factory" {
            return Err(syn::Error::new_spanned(&key, usage));
        }
        input.parse::<Token![=]>()?;
        let factory: Expr = input.parse()?;

        // Trailing comma is fine, anything after it is not.
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
        if !input.is_empty() {
            return Err(input.error(usage));
        }

        Ok(ScopeArgs { mode, factory })
    }
}

pub struct ParsedScope {
    pub args: ScopeArgs,
    pub is_async: bool,
}

pub fn parse(attr: proc_macro2::TokenStream, item: &ItemFn) -> syn::Result<ParsedScope> {
    let args: ScopeArgs = syn::parse2(attr)?;

    if let Some(constness) = &item.sig.constness {
        return Err(syn::Error::new_spanned(
            constness,
            "lock_scope cannot be applied to a const fn",
        ));
    }

    // The acquisition error is propagated with `?`, so the function must
    // return something `?` can feed into.
    if let ReturnType::Default = item.sig.output {
        return Err(syn::Error::new_spanned(
            &item.sig.ident,
            "lock_scope functions must return a Result whose error type implements From<LockError>",
        ));
    }

    Ok(ParsedScope {
        args,
        is_async: item.sig.asyncness.is_some(),
    })
}
