//! Attribute macros for the `errand` runtime.
//!
//! Both macros rewrite an `async fn` into a plain function whose body runs
//! on a freshly built runtime through `Runtime::block_on`.

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Runs an `async fn main` on an errand runtime.
///
/// Accepts `worker_threads = N` to size the executor:
///
/// ```rust,ignore
/// #[errand::main(worker_threads = 4)]
/// async fn main() {}
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, false)
}

/// Runs an `async` test on an errand runtime.
///
/// Takes the same arguments as [`macro@main`] and marks the function with
/// `#[test]`. The test may return a `Result`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, true)
}

fn expand(attr: TokenStream, item: TokenStream, is_test: bool) -> TokenStream {
    let worker_threads = match parse_args(attr) {
        Ok(worker_threads) => worker_threads,
        Err(message) => return compile_error(&message),
    };

    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some(async_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    else {
        return compile_error("the `async` keyword is missing from the function declaration");
    };
    tokens.remove(async_pos);

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return compile_error("expected a function body");
    };

    let TokenTree::Group(body) = &tokens[pos] else {
        return compile_error("expected a function body");
    };

    let mut builder = String::from("::errand::RuntimeBuilder::new()");
    if let Some(n) = worker_threads {
        builder.push_str(&format!(".worker_threads({n})"));
    }

    // Pin the async block's output so `?` in the body can infer its error.
    let body = match return_type(&tokens[..pos]) {
        Some(output) => format!("let output: {output} = {{ {} }}; output", body.stream()),
        None => body.stream().to_string(),
    };

    let new_body = format!(
        "{{
            let runtime = {builder}
                .build()
                .expect(\"failed to build the errand runtime\");
            runtime.block_on(async move {{ {body} }})
        }}"
    );

    let new_body = match new_body.parse::<TokenStream>() {
        Ok(stream) => stream,
        Err(err) => return compile_error(&format!("errand macro error: {err}")),
    };
    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, new_body));

    let mut output = TokenStream::new();
    if is_test {
        output.extend("#[::core::prelude::v1::test]".parse::<TokenStream>());
    }
    output.extend(tokens);
    output
}

/// Returns the tokens after `->` in a function signature, if any.
fn return_type(signature: &[TokenTree]) -> Option<String> {
    let arrow = signature.windows(2).position(|pair| {
        matches!(
            pair,
            [TokenTree::Punct(dash), TokenTree::Punct(gt)]
                if dash.as_char() == '-' && gt.as_char() == '>'
        )
    })?;

    let output: TokenStream = signature[arrow + 2..].iter().cloned().collect();
    Some(output.to_string())
}

/// Parses `key = value` pairs. Only `worker_threads` is recognised.
fn parse_args(attr: TokenStream) -> Result<Option<usize>, String> {
    let attr = attr.to_string();
    let mut worker_threads = None;

    for part in attr.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, value)) = part.split_once('=') else {
            return Err(format!("expected `key = value`, found `{part}`"));
        };

        match key.trim() {
            "worker_threads" => {
                let n = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("`worker_threads` must be an integer, found `{}`", value.trim()))?;
                if n == 0 {
                    return Err("`worker_threads` must be greater than 0".to_string());
                }
                worker_threads = Some(n);
            }
            other => return Err(format!("unknown attribute `{other}`")),
        }
    }

    Ok(worker_threads)
}

fn compile_error(message: &str) -> TokenStream {
    format!("::core::compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
