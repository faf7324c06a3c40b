use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous route test into a synchronous one running
/// against a server backed by an in-memory awards API.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// `crate::client::fake::FakeApi`, the handle to the fake the server talks to.
/// `#[awards_test(voter)]` signs the client in before the test body runs.
#[proc_macro_attribute]
pub fn awards_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the arguments to inject and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Sign the client in if needed.
    let maybe_sign_in = match parse_macro_input!(args as Option<Ident>) {
        Some(arg) if arg == "voter" => quote! {{
            let response = rocket_client
                .post(uri!(crate::api::auth::sign_in))
                .header(rocket::http::ContentType::JSON)
                .body(
                    rocket::serde::json::json!({
                        "token": crate::model::auth::AuthToken::example().credential(),
                    })
                    .to_string(),
                )
                .dispatch()
                .await;
            assert_eq!(rocket::http::Status::Ok, response.status(), "voter sign-in failed");
        }},
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected no argument or `voter`")
                .into_compile_error()
                .into();
        }
        None => TokenStream2::new(),
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (rocket::local::asynchronous::Client, crate::client::fake::FakeApi) {
                log4rs_test_utils::test_logging::init_logging_once_for(
                    ["bench_awards"],
                    None,
                    None,
                );

                let fake_api = std::sync::Arc::new(crate::client::fake::FakeAwardsApi::new(
                    crate::model::awards::Awards::example(),
                ));
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_api(fake_api.clone()),
                )
                .await
                .unwrap();

                #maybe_sign_in

                (rocket_client, fake_api)
            }

            /// The test itself.
            #item_fn

            // Create an async runtime. We need a separate one for inside and
            // outside the `catch_unwind`.
            let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("test-setup")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            // Run the setup.
            let (rocket_client, fake_api) = outer_runtime.block_on(setup());

            // Run the test, catching any panics.
            // Use mutexes to safely transfer `!UnwindSafe` data.
            let client_mutex = std::sync::Mutex::new(rocket_client);
            let api_mutex = std::sync::Mutex::new(fake_api);
            let runtime_mutex = std::sync::Mutex::new(inner_runtime);
            let result = std::panic::catch_unwind(|| {
                let rocket_client = client_mutex.into_inner().unwrap();
                let fake_api = api_mutex.into_inner().unwrap();
                let runtime = runtime_mutex.into_inner().unwrap();

                runtime.block_on(#new_name(#(#test_args),*));
            });

            // Shut the outer runtime down before reporting.
            drop(outer_runtime);

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                std::panic::resume_unwind(cause);
            }
        }
    }
    .into()
}

/// Ensure the wrapped test is async, map its parameters onto the injectable
/// dependencies, and reject anything else.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_api = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                if let Some(type_ident) = type_path.path.segments.last().map(|s| &s.ident) {
                    if type_ident == "Client" {
                        if has_client {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                            ));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if type_ident == "FakeApi" {
                        if has_api {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `FakeApi`",
                            ));
                        }
                        has_api = true;
                        args.push(quote! { fake_api.clone() });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `api_ident: FakeApi`",
        ));
    }

    Ok(args)
}
