use proc_macro2::TokenStream;
use quote::quote;

/// Wrap item tokens in syn::File and output formatted string
pub fn format_items(tokens: TokenStream) -> syn::Result<String> {
    let parsed = syn::parse_file(&tokens.to_string())?;
    Ok(prettyplease::unparse(&parsed))
}

/// Format an expression as the initializer of a static
pub fn format_expr(tokens: TokenStream) -> syn::Result<String> {
    format_items(quote! {
        static EXPR: ExprType = #tokens;
    })
}

#[cfg(test)]
pub fn assert_tokens_eq(left: TokenStream, right: TokenStream) {
    let left = format_expr(left).unwrap();
    let right = format_expr(right).unwrap();
    similar_asserts::assert_eq!(left, right);
}
