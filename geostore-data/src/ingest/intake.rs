//! Generic intake adapter shared by every parser.
//!
//! Parsers push decoded elements through [`ElementIntake::offer`], which polls
//! the cancellation token, forwards the element to the caller's callback and
//! keeps the running summary.

use std::ops::ControlFlow;

use geostore_core::{BoundingBox, CancellationToken, Element};

use super::{ElementSink, IngestError, IngestSummary};
use crate::FormatType;

pub(crate) struct ElementIntake<'a> {
    format: FormatType,
    cancel: &'a CancellationToken,
    on_element: &'a mut ElementSink<'a>,
    bounds: BoundingBox,
    offered: u64,
    retained: u64,
}

impl<'a> ElementIntake<'a> {
    pub(crate) fn new(
        format: FormatType,
        cancel: &'a CancellationToken,
        on_element: &'a mut ElementSink<'a>,
    ) -> Self {
        Self {
            format,
            cancel,
            on_element,
            bounds: BoundingBox::empty(),
            offered: 0,
            retained: 0,
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Offer one element, or report `Break` once cancellation is observed.
    pub(crate) fn offer(&mut self, element: &Element) -> Result<ControlFlow<()>, IngestError> {
        if self.is_cancelled() {
            return Ok(ControlFlow::Break(()));
        }
        self.offered += 1;
        self.bounds.expand(&element.bounding_box());
        if (self.on_element)(element).map_err(IngestError::Sink)? {
            self.retained += 1;
        }
        Ok(ControlFlow::Continue(()))
    }

    pub(crate) fn complete(self) -> IngestSummary {
        IngestSummary {
            format: self.format,
            bounds: self.bounds,
            offered: self.offered,
            retained: self.retained,
            cancelled: self.cancel.is_cancelled(),
        }
    }
}
