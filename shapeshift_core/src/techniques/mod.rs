//! Built-in techniques, grouped by category.

pub mod context;
pub mod encoding;
pub mod mutation;
pub mod structural;

use crate::technique::Technique;
use std::sync::Arc;

pub use context::{
    HtmlAttributeVariation, HtmlTagMutation, JsEvalWrap, JsTemplateLiteral, SqlCommentInject,
    SqlKeywordSplit,
};
pub use encoding::{Base64Encode, HexEncode, HtmlEntityDecimal, HtmlEntityHex, UnicodeEscape, UrlEncode};
pub use mutation::{AlternatingCase, HomoglyphSubstitution, RandomCase, ZeroWidthInsertion};
pub use structural::{CommentInjection, EncodingChain, StringConcatenation};

/// Every built-in technique, in registration order.
pub fn builtin() -> Vec<Arc<dyn Technique>> {
    vec![
        Arc::new(Base64Encode),
        Arc::new(UrlEncode),
        Arc::new(HtmlEntityDecimal),
        Arc::new(HtmlEntityHex),
        Arc::new(UnicodeEscape),
        Arc::new(HexEncode),
        Arc::new(RandomCase),
        Arc::new(AlternatingCase),
        Arc::new(HomoglyphSubstitution),
        Arc::new(ZeroWidthInsertion),
        Arc::new(StringConcatenation),
        Arc::new(CommentInjection),
        Arc::new(EncodingChain),
        Arc::new(JsTemplateLiteral),
        Arc::new(JsEvalWrap),
        Arc::new(SqlCommentInject),
        Arc::new(SqlKeywordSplit),
        Arc::new(HtmlAttributeVariation),
        Arc::new(HtmlTagMutation),
    ]
}
