use crate::errors::{Error, ErrorId, ErrorType, Errors, Severity};
use crate::parse::cst::TokenKind;
use crate::source::Span;

impl Errors {
    pub(crate) fn parse_error(&mut self, at: Span) -> ParseErrors {
        ParseErrors { errors: self, primary: at }
    }
}

pub(crate) struct ParseErrors<'a> {
    errors: &'a mut Errors,
    primary: Span,
}

impl ParseErrors<'_> {
    pub fn expected_token(&mut self, kind: TokenKind) -> ErrorId {
        let error = self.error(format!("expected `{}`", kind.display()));
        self.errors.add(error)
    }

    /// Raised once per contiguous run of tokens discarded during recovery.
    /// `what` names the production the parser was looking for.
    pub fn skipped_tokens(&mut self, what: &str) -> ErrorId {
        let error = self
            .error(format!("expected {what}"))
            .with_note("the highlighted tokens were skipped");
        self.errors.add(error)
    }

    pub fn expected_expression(&mut self) -> ErrorId {
        let error = self.error("expected an expression");
        self.errors.add(error)
    }

    pub fn expected(&mut self, what: &str) -> ErrorId {
        let error = self.error(format!("expected {what}"));
        self.errors.add(error)
    }

    fn error(&mut self, title: impl Into<String>) -> Error {
        Error::new(ErrorType::Syntax, Severity::Error, self.primary, title)
    }
}
