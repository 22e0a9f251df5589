use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, Iteration};
use crate::foundation::error::{PlanevizError, PlanevizResult, Stage};
use crate::frame::pipeline::FramePipeline;
use crate::frame::spec::FrameSpec;
use crate::render::backend::{FrameGeometry, FrameRGBA, FrameRenderer};
use crate::render::style::RenderStyle;

/// Draw one frame: color map, streamlines, outlines, then the corner annotation.
pub fn render_frame_spec(
    renderer: &mut dyn FrameRenderer,
    spec: &FrameSpec,
    style: &RenderStyle,
) -> PlanevizResult<FrameRGBA> {
    let scalar = spec.scalar();
    renderer.begin(&FrameGeometry {
        bbox: *scalar.bbox(),
        axis_labels: spec.axis_labels().map(str::to_owned),
        label: spec.label().to_owned(),
    })?;
    renderer.color_map(scalar, &style.color_map)?;
    if style.streamlines.enabled {
        renderer.streamlines(
            &spec.coordinates(),
            spec.vector_x(),
            spec.vector_y(),
            &style.streamlines,
        )?;
    }
    for outline in spec.outlines() {
        renderer.outline(outline, &style.outlines)?;
    }
    if style.annotation
        && let Some(text) = spec.annotation()
    {
        renderer.text(text, style.annotation_corner)?;
    }
    renderer.finish()
}

/// Range render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovieStats {
    /// Frames the pipeline lists.
    pub frames_total: u64,
    /// Frames rendered and handed to the sink.
    pub frames_rendered: u64,
    /// First iteration rendered.
    pub first: Option<Iteration>,
    /// Last iteration rendered.
    pub last: Option<Iteration>,
}

/// Drives a [`FramePipeline`] through a renderer into a sink, one frame at a time.
///
/// Frames are produced, drawn and pushed strictly in iteration order; each frame is dropped before
/// the next one is produced.
#[derive(Debug)]
pub struct MovieSession<'a> {
    pipeline: FramePipeline<'a>,
    style: RenderStyle,
}

impl<'a> MovieSession<'a> {
    /// Pair a pipeline with the style its frames are drawn in.
    pub fn new(pipeline: FramePipeline<'a>, style: RenderStyle) -> PlanevizResult<Self> {
        style.validate()?;
        Ok(Self { pipeline, style })
    }

    /// The underlying pipeline.
    pub fn pipeline(&self) -> &FramePipeline<'a> {
        &self.pipeline
    }

    /// The render style.
    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// Produce and draw the frame of `iteration`.
    pub fn render_iteration(
        &self,
        renderer: &mut dyn FrameRenderer,
        iteration: Iteration,
    ) -> PlanevizResult<FrameRGBA> {
        let spec = self.pipeline.frame(iteration)?;
        render_frame_spec(renderer, &spec, &self.style).map_err(|e| e.at(iteration, Stage::Render))
    }

    /// Render every pipeline iteration and stream the frames into `sink`.
    ///
    /// The sink sees `begin`, one `push_frame` per iteration in increasing order, then `end`.
    /// On a failed frame the sink is still ended and the frame error is returned.
    #[tracing::instrument(skip_all, fields(frames = self.pipeline.len()))]
    pub fn render_range(
        &self,
        renderer: &mut dyn FrameRenderer,
        sink: &mut dyn FrameSink,
        fps: Fps,
    ) -> PlanevizResult<MovieStats> {
        if self.pipeline.is_empty() {
            return Err(PlanevizError::validation(
                "no iterations to render (check the iteration window)",
            ));
        }
        let canvas = self.style.canvas;
        sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps,
        })?;

        let mut stats = MovieStats {
            frames_total: self.pipeline.len() as u64,
            ..MovieStats::default()
        };
        let result = self.stream(renderer, sink, &mut stats);
        let ended = sink.end();
        match (result, ended) {
            (Err(e), ended) => {
                if let Err(end_err) = ended {
                    tracing::warn!(error = %end_err, "sink failed to finish after frame error");
                }
                Err(e)
            }
            (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => {
                tracing::info!(rendered = stats.frames_rendered, "movie finished");
                Ok(stats)
            }
        }
    }

    fn stream(
        &self,
        renderer: &mut dyn FrameRenderer,
        sink: &mut dyn FrameSink,
        stats: &mut MovieStats,
    ) -> PlanevizResult<()> {
        for iteration in self.pipeline.iterations() {
            let frame = self.render_iteration(renderer, iteration)?;
            sink.push_frame(iteration, &frame)
                .map_err(|e| e.at(iteration, Stage::Encode))?;
            stats.frames_rendered += 1;
            stats.first.get_or_insert(iteration);
            stats.last = Some(iteration);
            tracing::debug!(%iteration, "frame pushed");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/movie.rs"]
mod tests;
