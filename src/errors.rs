use crate::source::Span;

/// Identifies a particular reported message.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ErrorId(usize);

impl ErrorId {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// Stores reported errors. Append-only; iteration order is report order,
/// which for a single input equals source order.
#[derive(Debug, Default)]
pub struct Errors {
    errors: Vec<Error>,

    num_errors: usize,
    num_warnings: usize,
    num_infos: usize,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: Error) -> ErrorId {
        match error.severity {
            Severity::Error => self.num_errors += 1,
            Severity::Warning => self.num_warnings += 1,
            Severity::Info => self.num_infos += 1,
        };

        self.errors.push(error);
        ErrorId(self.errors.len() - 1)
    }

    pub fn get(&self, id: ErrorId) -> &Error {
        &self.errors[id.0]
    }

    /// Attach another label to an already-reported error.
    pub fn get_mut(&mut self, id: ErrorId) -> &mut Error {
        &mut self.errors[id.0]
    }

    /// The anchor span of the most recently reported error, if any.
    pub fn last_span(&self) -> Option<Span> {
        self.errors.last().map(|error| error.at)
    }

    /// The id of the most recently reported error, if any.
    pub fn last_id(&self) -> Option<ErrorId> {
        self.errors.len().checked_sub(1).map(ErrorId)
    }

    pub fn is_perfect(&self) -> bool {
        self.num_errors == 0 && self.num_warnings == 0
    }

    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    pub fn num_warnings(&self) -> usize {
        self.num_warnings
    }

    pub fn iter(&self) -> impl Iterator<Item = (ErrorId, &Error)> {
        self.errors.iter().enumerate().map(|(id, error)| (ErrorId(id), error))
    }
}

#[derive(Debug)]
pub struct Error {
    pub ty: ErrorType,
    pub severity: Severity,
    pub at: Span,
    pub title: String,
    pub labels: Vec<(String, Span)>,
    pub notes: Vec<(String, NoteType)>,
}

impl Error {
    pub fn new(ty: ErrorType, severity: Severity, at: Span, title: impl Into<String>) -> Self {
        Self {
            ty,
            severity,
            at,
            title: title.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_label(mut self, at: Span, message: impl Into<String>) -> Self {
        self.labels.push((message.into(), at));
        self
    }

    pub fn with_help(mut self, message: impl Into<String>) -> Self {
        self.notes.push((message.into(), NoteType::Help));
        self
    }

    pub fn with_note(mut self, message: impl Into<String>) -> Self {
        self.notes.push((message.into(), NoteType::Note));
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ErrorType {
    Syntax,
    Hierarchy,
    Evaluation,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum NoteType {
    Help,
    Note,
}
