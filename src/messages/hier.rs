use crate::errors::{Error, ErrorId, ErrorType, Errors, Severity};
use crate::source::Span;

impl Errors {
    pub(crate) fn hier_error(&mut self, at: Span) -> HierErrors {
        HierErrors { errors: self, primary: at }
    }
}

pub(crate) struct HierErrors<'a> {
    errors: &'a mut Errors,
    primary: Span,
}

impl HierErrors<'_> {
    pub fn redefined(&mut self, previous: Span, name: &str) -> ErrorId {
        let error = self
            .error(ErrorType::Hierarchy, format!("duplicate declaration of `{name}`"))
            .with_label(previous, "previously declared here")
            .with_note("the first declaration is kept; later ones are ignored by name lookup");
        self.errors.add(error)
    }

    pub fn duplicate_definition(&mut self, previous: Span, name: &str) -> ErrorId {
        let error = self
            .error(ErrorType::Hierarchy, format!("duplicate definition of `{name}`"))
            .with_label(previous, "previously defined here");
        self.errors.add(error)
    }

    pub fn unknown_definition(&mut self, name: &str) -> ErrorId {
        let error =
            self.error(ErrorType::Hierarchy, format!("unknown module or interface `{name}`"));
        self.errors.add(error)
    }

    pub fn unknown_top_module(&mut self, name: &str) -> ErrorId {
        let error = self
            .error(ErrorType::Hierarchy, format!("no definition found for top module `{name}`"));
        self.errors.add(error)
    }

    pub fn unknown_parameter(&mut self, name: &str, definition: &str) -> ErrorId {
        let error = self.error(
            ErrorType::Hierarchy,
            format!("`{definition}` has no parameter named `{name}`"),
        );
        self.errors.add(error)
    }

    pub fn local_parameter_override(&mut self, name: &str) -> ErrorId {
        let error = self
            .error(ErrorType::Hierarchy, format!("cannot override local parameter `{name}`"));
        self.errors.add(error)
    }

    pub fn too_many_parameter_overrides(&mut self, definition: &str, expected: usize) -> ErrorId {
        let error = self.error(
            ErrorType::Hierarchy,
            format!("too many parameter overrides for `{definition}`"),
        )
        .with_note(format!("`{definition}` declares {expected} overridable parameters"));
        self.errors.add(error)
    }

    pub fn instance_depth_limit(&mut self, limit: usize) -> ErrorId {
        let error = self
            .error(ErrorType::Hierarchy, "instance hierarchy is too deep")
            .with_note(format!("the limit is {limit} nested instances"));
        self.errors.add(error)
    }

    pub fn generate_loop_limit(&mut self, limit: usize) -> ErrorId {
        let error = self
            .error(ErrorType::Evaluation, "generate loop exceeds the iteration limit")
            .with_note(format!("the limit is {limit} iterations"));
        self.errors.add(error)
    }

    pub fn invalid_genvar_step(&mut self) -> ErrorId {
        let error = self
            .error(ErrorType::Evaluation, "generate loop step must modify the loop variable")
            .with_note("expected something like `i = i + 1`, `i += 1`, or `i++`");
        self.errors.add(error)
    }

    pub fn not_constant(&mut self) -> ErrorId {
        let error = self.error(ErrorType::Evaluation, "expression is not a constant");
        self.errors.add(error)
    }

    pub fn unknown_name(&mut self, name: &str) -> ErrorId {
        let error = self.error(ErrorType::Evaluation, format!("use of undeclared name `{name}`"));
        self.errors.add(error)
    }

    pub fn not_a_parameter(&mut self, name: &str) -> ErrorId {
        let error = self.error(
            ErrorType::Evaluation,
            format!("`{name}` does not name a parameter value"),
        );
        self.errors.add(error)
    }

    pub fn division_by_zero(&mut self) -> ErrorId {
        let error = self.error(ErrorType::Evaluation, "division by zero in constant expression");
        self.errors.add(error)
    }

    fn error(&mut self, ty: ErrorType, title: impl Into<String>) -> Error {
        Error::new(ty, Severity::Error, self.primary, title)
    }
}
