//! Login Form Component
//!
//! Sign-in with "remember me", and a toggle to the registration form.
//! A successful registration signs the new account in right away.

use leptos::prelude::*;
use leptos::task::spawn_local;
use taskboard_core::client::Registration;
use taskboard_core::{LoginOutcome, Session};

use crate::context::{use_app_context, AppContext};

/// Local checks before a registration is sent
fn registration_error(password: &str, confirm: &str) -> Option<&'static str> {
    if password != confirm {
        Some("Passwords do not match")
    } else {
        None
    }
}

/// Name shown for the account; falls back to the email
fn display_name(name: &str, email: &str) -> String {
    match name.trim() {
        "" => email.trim().to_string(),
        name => name.to_string(),
    }
}

async fn sign_in(
    ctx: AppContext,
    session: &Session,
    email: &str,
    password: &str,
    remember: bool,
) -> Result<(), String> {
    match session.login(&ctx.client(), email, password, remember).await {
        Ok(LoginOutcome::Authenticated(_)) => {
            ctx.signed_in();
            Ok(())
        }
        Ok(LoginOutcome::InvalidCredentials { message, .. }) => Err(message),
        Err(err) => Err(err.user_message()),
    }
}

#[component]
pub fn LoginForm() -> impl IntoView {
    let ctx = use_app_context();

    let (registering, set_registering) = signal(false);
    let (user_name, set_user_name) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (confirm, set_confirm) = signal(String::new());
    let (remember, set_remember) = signal(true);
    let (pending, set_pending) = signal(false);
    let (message, set_message) = signal(ctx.take_notice());

    let on_login = move || {
        let session = ctx.session();
        let email = email.get().trim().to_string();
        let (password, remember) = (password.get(), remember.get());
        spawn_local(async move {
            if let Err(text) = sign_in(ctx, &session, &email, &password, remember).await {
                set_message.set(Some(text));
            }
            set_pending.set(false);
        });
    };

    let on_register = move || {
        let session = ctx.session();
        let client = ctx.client();
        let email = email.get().trim().to_string();
        let registration = Registration {
            user_name: display_name(&user_name.get(), &email),
            email: email.clone(),
            password: password.get(),
        };
        let remember = remember.get();
        spawn_local(async move {
            match client.register_user(&registration).await {
                Ok(_) => {
                    log::info!("registered {}", registration.email);
                    let signed = sign_in(ctx, &session, &email, &registration.password, remember).await;
                    if let Err(text) = signed {
                        set_registering.set(false);
                        set_message.set(Some(format!("Account created, but sign-in failed: {text}")));
                    }
                }
                Err(err) => set_message.set(Some(err.user_message())),
            }
            set_pending.set(false);
        });
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if pending.get() || email.get().trim().is_empty() || password.get().is_empty() {
            return;
        }
        if registering.get() {
            if let Some(text) = registration_error(&password.get(), &confirm.get()) {
                set_message.set(Some(text.to_string()));
                return;
            }
        }
        set_pending.set(true);
        set_message.set(None);
        if registering.get() {
            on_register();
        } else {
            on_login();
        }
    };

    view! {
        <form class="login-form" on:submit=on_submit>
            <h1>{move || if registering.get() { "Create account" } else { "Sign in" }}</h1>

            <Show when=move || registering.get()>
                <input
                    type="text"
                    placeholder="Name"
                    prop:value=move || user_name.get()
                    on:input=move |ev| set_user_name.set(event_target_value(&ev))
                />
            </Show>
            <input
                type="email"
                placeholder="Email"
                prop:value=move || email.get()
                on:input=move |ev| set_email.set(event_target_value(&ev))
            />
            <input
                type="password"
                placeholder="Password"
                prop:value=move || password.get()
                on:input=move |ev| set_password.set(event_target_value(&ev))
            />
            <Show when=move || registering.get()>
                <input
                    type="password"
                    placeholder="Confirm password"
                    prop:value=move || confirm.get()
                    on:input=move |ev| set_confirm.set(event_target_value(&ev))
                />
            </Show>
            <Show when=move || !registering.get()>
                <label class="remember">
                    <input
                        type="checkbox"
                        prop:checked=move || remember.get()
                        on:change=move |ev| set_remember.set(event_target_checked(&ev))
                    />
                    "Remember me"
                </label>
            </Show>

            {move || message.get().map(|text| view! { <p class="form-message">{text}</p> })}

            <button type="submit" disabled=move || pending.get()>
                {move || if registering.get() { "Register" } else { "Sign in" }}
            </button>
            <button
                type="button"
                class="link-btn"
                on:click=move |_| {
                    set_message.set(None);
                    set_confirm.set(String::new());
                    set_registering.update(|r| *r = !*r);
                }
            >
                {move || if registering.get() { "Back to sign in" } else { "Create an account" }}
            </button>
        </form>
    }
}
