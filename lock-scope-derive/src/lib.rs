use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn};

mod gen_scope;
mod parse;

/// Run the annotated function's body inside a lock scope.
///
/// ```ignore
/// #[lock_scope(write, factory = self.locks)]
/// fn rebuild(&self) -> Result<(), MyError> { ... }
/// ```
///
/// The scope is acquired before the body runs and released when the function
/// returns, on every path. A failed acquisition returns early through `?`, so
/// the function's error type must implement `From<LockError>`. On an
/// `async fn` the acquisition is awaited.
#[proc_macro_attribute]
pub fn lock_scope(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item_fn = parse_macro_input!(item as ItemFn);
    let attr2 = proc_macro2::TokenStream::from(attr);

    let parsed = match parse::parse(attr2, &item_fn) {
        Ok(p) => p,
        Err(e) => return e.to_compile_error().into(),
    };

    gen_scope::generate(&parsed, item_fn).into()
}
