//! Workflow execution engine — the row-draining traversal loop.

use std::sync::Arc;

use sheetcast_types::{
    CaptionGenerator, Publisher, Result, RowSource, RunContext, NO_MORE_ROWS,
};

/// Traversal bound guarding against pathological cycles. Each executed step
/// counts as one traversal.
pub const DEFAULT_MAX_STEPS: usize = 100;

// ---------------------------------------------------------------------------
// Step — the workflow states
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    FilterRows,
    GenerateCaption,
    PostInstagram,
    PostFacebook,
    ClearRow,
    End,
}

/// Decide the state that follows `completed`, given the context it produced.
///
/// The branch points mirror the conditional edges of the pipeline: publishing
/// continues only while each platform reported a post id and no error is set;
/// the clear step loops back while rows remain.
pub fn transition(completed: Step, ctx: &RunContext) -> Step {
    match completed {
        Step::FilterRows => Step::GenerateCaption,
        Step::GenerateCaption => Step::PostInstagram,
        Step::PostInstagram => {
            if ctx.instagram_post_id.is_some() && !ctx.has_error() {
                Step::PostFacebook
            } else {
                Step::End
            }
        }
        Step::PostFacebook => {
            if ctx.facebook_post_id.is_some() && !ctx.has_error() {
                Step::ClearRow
            } else {
                Step::End
            }
        }
        Step::ClearRow => {
            if ctx.exhausted() {
                Step::End
            } else {
                Step::GenerateCaption
            }
        }
        Step::End => Step::End,
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Bookkeeping for one completed run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Steps executed, including no-op steps skipped by the error guard.
    pub steps: usize,
    /// Rows published to both platforms.
    pub rows_posted: usize,
    /// Rows whose clear call also succeeded.
    pub rows_cleared: usize,
    /// The context error at the moment the run ended, if any. The
    /// no-more-rows signal shows up here on an empty sheet.
    pub final_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// The workflow controller. Owns the four collaborators behind their trait
/// seams and exclusively owns the per-run context while driving it through
/// the steps.
pub struct Workflow {
    source: Arc<dyn RowSource>,
    captioner: Arc<dyn CaptionGenerator>,
    instagram: Arc<dyn Publisher>,
    facebook: Arc<dyn Publisher>,
    max_steps: usize,
}

impl Workflow {
    pub fn new(
        source: Arc<dyn RowSource>,
        captioner: Arc<dyn CaptionGenerator>,
        instagram: Arc<dyn Publisher>,
        facebook: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            source,
            captioner,
            instagram,
            facebook,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Drain the pending rows once, start to finish.
    pub async fn run(&self) -> Result<RunReport> {
        let mut ctx = RunContext::default();
        let mut report = RunReport::default();
        let mut step = Step::FilterRows;

        while step != Step::End {
            if report.steps >= self.max_steps {
                tracing::error!(
                    max_steps = self.max_steps,
                    "Traversal bound reached, ending run"
                );
                break;
            }
            report.steps += 1;
            tracing::debug!(?step, row_index = ctx.current_index, "Entering step");

            match step {
                Step::FilterRows => self.filter_rows(&mut ctx).await,
                Step::GenerateCaption => self.generate_caption(&mut ctx).await,
                Step::PostInstagram => self.post_instagram(&mut ctx).await,
                Step::PostFacebook => self.post_facebook(&mut ctx).await,
                Step::ClearRow => self.clear_row(&mut ctx, &mut report).await,
                Step::End => unreachable!("End is checked by the loop condition"),
            }

            step = transition(step, &ctx);
        }

        report.final_error = ctx.error.clone();
        tracing::info!(
            steps = report.steps,
            rows_posted = report.rows_posted,
            rows_cleared = report.rows_cleared,
            "Run finished"
        );
        Ok(report)
    }

    /// Fetch and filter the pending rows. Runs exactly once per run; a fetch
    /// failure lands in the context error rather than escaping, so the
    /// downstream steps no-op and the run winds down.
    async fn filter_rows(&self, ctx: &mut RunContext) {
        match self.source.fetch_rows().await {
            Ok(rows) => {
                ctx.rows = rows;
                ctx.current_index = 0;
                ctx.error = None;
            }
            Err(e) => {
                ctx.set_error(format!("Error filtering rows: {e}"));
                tracing::error!(error = %e, "Row fetch failed");
            }
        }
    }

    async fn generate_caption(&self, ctx: &mut RunContext) {
        if let Some(error) = &ctx.error {
            tracing::warn!(%error, "Skipping caption generation due to existing error");
            return;
        }
        let Some(row) = ctx.current_row() else {
            ctx.set_error(NO_MORE_ROWS);
            return;
        };
        let (row_number, prompt) = (row.row_number, row.prompt.clone());

        match self.captioner.generate(&prompt).await {
            Ok(caption) => {
                tracing::info!(row_number, "Caption ready");
                ctx.caption = Some(caption);
                ctx.error = None;
            }
            Err(e) => {
                ctx.set_error(format!("Error generating caption: {e}"));
                tracing::error!(row_number, error = %e, "Caption generation failed");
            }
        }
    }

    async fn post_instagram(&self, ctx: &mut RunContext) {
        if let Some(error) = &ctx.error {
            tracing::warn!(%error, "Skipping Instagram post due to existing error");
            return;
        }
        let Some(row) = ctx.current_row() else {
            ctx.set_error(NO_MORE_ROWS);
            return;
        };
        let (row_number, image_url) = (row.row_number, row.image_url.clone());
        let Some(caption) = ctx.caption.clone() else {
            ctx.set_error("Error creating Instagram post: no caption available");
            return;
        };

        match self.instagram.publish_photo(&image_url, &caption).await {
            Ok(post_id) => {
                tracing::info!(row_number, post_id = %post_id, "Instagram post created");
                ctx.instagram_post_id = Some(post_id);
                ctx.error = None;
            }
            Err(e) => {
                ctx.set_error(format!("Error creating Instagram post: {e}"));
                tracing::error!(row_number, error = %e, "Instagram post failed");
            }
        }
    }

    async fn post_facebook(&self, ctx: &mut RunContext) {
        if let Some(error) = &ctx.error {
            tracing::warn!(%error, "Skipping Facebook post due to existing error");
            return;
        }
        let Some(row) = ctx.current_row() else {
            ctx.set_error(NO_MORE_ROWS);
            return;
        };
        let (row_number, image_url) = (row.row_number, row.image_url.clone());
        let Some(caption) = ctx.caption.clone() else {
            ctx.set_error("Error creating Facebook post: no caption available");
            return;
        };

        match self.facebook.publish_photo(&image_url, &caption).await {
            Ok(post_id) => {
                tracing::info!(row_number, post_id = %post_id, "Facebook post created");
                ctx.facebook_post_id = Some(post_id);
                ctx.error = None;
            }
            Err(e) => {
                ctx.set_error(format!("Error creating Facebook post: {e}"));
                tracing::error!(row_number, error = %e, "Facebook post failed");
            }
        }
    }

    /// Clear the published row and advance. A clear failure is logged and
    /// deliberately does not block advancing: re-processing an already
    /// published row would double-post, which is worse than a stale row.
    async fn clear_row(&self, ctx: &mut RunContext, report: &mut RunReport) {
        let Some(row) = ctx.current_row() else {
            ctx.set_error(NO_MORE_ROWS);
            return;
        };
        let row_number = row.row_number;
        report.rows_posted += 1;

        match self.source.clear_row(row_number).await {
            Ok(()) => report.rows_cleared += 1,
            Err(e) => {
                tracing::warn!(
                    row_number,
                    error = %e,
                    "Failed to clear row, proceeding to next row to avoid re-processing"
                );
            }
        }

        ctx.advance();
        tracing::info!(next_index = ctx.current_index, "Moved to next row");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
