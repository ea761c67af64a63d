// edugate-core/src/http/i18n.rs
//
// User-facing strings. Every failure kind gets its own message so clients can
// react to it specifically.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::request::Parts;
use axum::http::HeaderMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    Ar,
}

impl Lang {
    /// Picks the first supported language in an `Accept-Language` value.
    /// Quality weights are ignored; listing order wins.
    pub fn from_accept_language(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Lang::En;
        };
        for tag in value.split(',') {
            let tag = tag.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            if tag.starts_with("ar") {
                return Lang::Ar;
            }
            if tag.starts_with("en") {
                return Lang::En;
            }
        }
        Lang::En
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_accept_language(headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Lang {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Lang::from_headers(&parts.headers))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    CodeRedeemed,
    RedemptionHistory,
    Entitlements,
    Fetched,
    PoolCreated,
    PoolDeleted,
    Validation,
    NotFound,
    CodeNotFound,
    CodeAlreadyUsed,
    PoolExpired,
    DuplicateRedemptionInPool,
    Unauthorized,
    Forbidden,
    WriteConflict,
    PoolHasUsedCodes,
    CodeCollision,
    Internal,
}

pub fn message(lang: Lang, msg: Msg) -> &'static str {
    match lang {
        Lang::En => match msg {
            Msg::CodeRedeemed => "Code redeemed successfully",
            Msg::RedemptionHistory => "Redeemed codes fetched successfully",
            Msg::Entitlements => "Entitlements fetched successfully",
            Msg::Fetched => "Fetched successfully",
            Msg::PoolCreated => "Codes group created successfully",
            Msg::PoolDeleted => "Codes group deleted successfully",
            Msg::Validation => "Validation failed",
            Msg::NotFound => "Not found",
            Msg::CodeNotFound => "Code not found",
            Msg::CodeAlreadyUsed => "This code has already been used",
            Msg::PoolExpired => "This code has expired",
            Msg::DuplicateRedemptionInPool => "You have already redeemed a code from this group",
            Msg::Unauthorized => "Unauthorized",
            Msg::Forbidden => "You do not have access to this content",
            Msg::WriteConflict => "The request conflicted with another one, please try again",
            Msg::PoolHasUsedCodes => "Cannot delete a codes group that has used codes",
            Msg::CodeCollision => "Could not generate unique codes, please try again",
            Msg::Internal => "Something went wrong",
        },
        Lang::Ar => match msg {
            Msg::CodeRedeemed => "تم تفعيل الكود بنجاح",
            Msg::RedemptionHistory => "تم جلب الأكواد المفعلة بنجاح",
            Msg::Entitlements => "تم جلب الصلاحيات بنجاح",
            Msg::Fetched => "تم الجلب بنجاح",
            Msg::PoolCreated => "تم إنشاء مجموعة الأكواد بنجاح",
            Msg::PoolDeleted => "تم حذف مجموعة الأكواد بنجاح",
            Msg::Validation => "البيانات المدخلة غير صحيحة",
            Msg::NotFound => "غير موجود",
            Msg::CodeNotFound => "الكود غير موجود",
            Msg::CodeAlreadyUsed => "هذا الكود مستخدم بالفعل",
            Msg::PoolExpired => "انتهت صلاحية هذا الكود",
            Msg::DuplicateRedemptionInPool => "لقد قمت بتفعيل كود من هذه المجموعة مسبقاً",
            Msg::Unauthorized => "غير مصرح",
            Msg::Forbidden => "ليس لديك صلاحية للوصول إلى هذا المحتوى",
            Msg::WriteConflict => "تعارض الطلب مع طلب آخر، يرجى المحاولة مرة أخرى",
            Msg::PoolHasUsedCodes => "لا يمكن حذف مجموعة أكواد تحتوي على أكواد مستخدمة",
            Msg::CodeCollision => "تعذر توليد أكواد فريدة، يرجى المحاولة مرة أخرى",
            Msg::Internal => "حدث خطأ ما",
        },
    }
}
