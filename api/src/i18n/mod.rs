//! Localized response messages (English and Persian)

use actix_web::{http::header, HttpRequest};
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub use sf_shared::types::Language;

#[derive(Debug, Clone, Copy)]
pub struct LocalizedMessage {
    pub en: &'static str,
    pub fa: &'static str,
}

static MESSAGES: Lazy<HashMap<&'static str, LocalizedMessage>> = Lazy::new(|| {
    let entries = [
        (
            "otp.sent",
            "Verification code sent. Please check your SMS.",
            "کد تایید ارسال شد. لطفا پیامک خود را بررسی کنید.",
        ),
        (
            "otp.delivery_failed",
            "Verification code created but the SMS could not be sent.",
            "کد تایید ایجاد شد اما ارسال پیامک ناموفق بود.",
        ),
        (
            "otp.already_pending",
            "A code was already sent. Try again in {remaining_time}.",
            "کد تایید قبلا ارسال شده است. {remaining_time} دیگر دوباره تلاش کنید.",
        ),
        (
            "otp.verified",
            "Signed in successfully.",
            "ورود با موفقیت انجام شد.",
        ),
        (
            "error.forbidden",
            "This phone number is not allowed to sign in.",
            "این شماره تلفن مجاز به ورود نیست.",
        ),
        (
            "error.otp_expired",
            "Verification code has expired or was never requested.",
            "کد تایید منقضی شده یا درخواست نشده است.",
        ),
        (
            "error.otp_incorrect",
            "Verification code is incorrect.",
            "کد تایید نادرست است.",
        ),
        (
            "error.otp_too_many_attempts",
            "Too many incorrect attempts. Please request a new code.",
            "تعداد تلاش‌های ناموفق بیش از حد مجاز است. لطفا کد جدید درخواست کنید.",
        ),
        (
            "error.token_missing",
            "Sign-in credential not provided.",
            "توکن ورود ارسال نشده است.",
        ),
        (
            "error.token_scheme",
            "The Authorization header must start with \"Bearer \".",
            "هدر Authorization باید با \"Bearer \" شروع شود.",
        ),
        (
            "error.token_invalid",
            "Sign-in credential is not valid.",
            "توکن ورود معتبر نیست.",
        ),
        (
            "error.token_expired",
            "Sign-in credential has expired. Please sign in again.",
            "توکن ورود منقضی شده است. لطفا دوباره وارد شوید.",
        ),
        (
            "error.rate_limited",
            "Too many requests. Please wait a few minutes and try again.",
            "تعداد درخواست‌های شما از حد مجاز بیشتر است. لطفاً چند دقیقه صبر کنید.",
        ),
        (
            "error.phone_invalid",
            "Invalid phone number.",
            "شماره تلفن نامعتبر است.",
        ),
        (
            "error.validation",
            "Invalid request data.",
            "داده‌های درخواست نامعتبر است.",
        ),
        (
            "error.not_found",
            "The requested resource was not found.",
            "منبع درخواستی یافت نشد.",
        ),
        (
            "error.database",
            "A storage error occurred. Please try again later.",
            "خطای ذخیره‌سازی رخ داد. لطفا بعدا دوباره تلاش کنید.",
        ),
        (
            "error.internal",
            "An internal error occurred.",
            "خطای داخلی رخ داد.",
        ),
    ];

    entries
        .into_iter()
        .map(|(key, en, fa)| (key, LocalizedMessage { en, fa }))
        .collect()
});

/// Message for a key in the requested language; the key itself when unknown
pub fn get_message(key: &str, lang: Language) -> String {
    match MESSAGES.get(key) {
        Some(message) => match lang {
            Language::English => message.en.to_string(),
            Language::Persian => message.fa.to_string(),
        },
        None => key.to_string(),
    }
}

/// Replace `{name}` placeholders
pub fn format_message(template: &str, params: &HashMap<&str, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in params {
        result = result.replace(&format!("{{{}}}", key), value);
    }
    result
}

/// Language from the `Accept-Language` header, English by default
pub fn language_of(req: &HttpRequest) -> Language {
    req.headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(Language::from_accept_language)
        .unwrap_or_default()
}
