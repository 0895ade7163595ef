//! The rebuild-domain session: a document mirror, the rebuild engine,
//! and the debounced invalidation loop, driven entirely by messages
//! plus a caller-supplied clock tick.
//!
//! The mirror is this domain's own replica; the only things crossing
//! the boundary are update bytes in and typed result messages out.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use doc_store::{Document, Origin, SiteId};
use feature_engine::{PreviewSpec, RebuildEngine, RebuildOutput};

use crate::debounce::Debouncer;
use crate::messages::{ControlMessage, ResultMessage};
use crate::stl;

pub struct WorkerSession {
    mirror: Document,
    engine: RebuildEngine,
    debounce: Debouncer,
    outbox: Vec<ResultMessage>,
    /// Output of the most recent rebuild, reused by exports.
    last_output: Option<RebuildOutput>,
}

impl WorkerSession {
    /// Session with the deterministic analytic kernel.
    pub fn new(site: SiteId) -> Self {
        Self::with_engine(site, RebuildEngine::analytic())
    }

    pub fn with_engine(site: SiteId, engine: RebuildEngine) -> Self {
        Self {
            mirror: Document::new(site, "mirror"),
            engine,
            debounce: Debouncer::default(),
            outbox: Vec::new(),
            last_output: None,
        }
    }

    pub fn mirror(&self) -> &Document {
        &self.mirror
    }

    /// Process one control message. Rebuild work is deferred to `tick`.
    pub fn handle(&mut self, msg: ControlMessage, now_ms: u64) {
        match msg {
            ControlMessage::InitSync { update } => match self.mirror.apply_update(&update) {
                Ok(()) => {
                    self.outbox.push(ResultMessage::Ready);
                    self.debounce.mark(now_ms);
                }
                Err(e) => self.outbox.push(ResultMessage::Error {
                    message: format!("init-sync failed: {e}"),
                }),
            },
            ControlMessage::DocumentUpdate { update } => {
                // An empty catch-up delta is a no-op, not an invalidation.
                match doc_store::update::decode_bundle(&update) {
                    Ok(updates) if updates.is_empty() => {}
                    Ok(_) => match self.mirror.apply_update(&update) {
                        Ok(()) => self.debounce.mark(now_ms),
                        Err(e) => self.outbox.push(ResultMessage::Error {
                            message: format!("document update rejected: {e}"),
                        }),
                    },
                    Err(e) => self.outbox.push(ResultMessage::Error {
                        message: format!("document update rejected: {e}"),
                    }),
                }
            }
            ControlMessage::PreviewExtrude {
                sketch_id,
                distance,
                direction,
                op,
            } => {
                let spec = PreviewSpec::Extrude {
                    sketch: sketch_id,
                    distance,
                    direction,
                };
                match self.engine.preview(&self.mirror, &spec) {
                    Ok(mesh) => self.outbox.push(ResultMessage::PreviewMesh { mesh, op }),
                    Err(e) => self.outbox.push(ResultMessage::PreviewError {
                        message: e.to_string(),
                    }),
                }
            }
            ControlMessage::PreviewRevolve {
                sketch_id,
                axis_entity_id,
                angle,
                op,
            } => {
                let spec = PreviewSpec::Revolve {
                    sketch: sketch_id,
                    axis: axis_entity_id,
                    angle,
                };
                match self.engine.preview(&self.mirror, &spec) {
                    Ok(mesh) => self.outbox.push(ResultMessage::PreviewMesh { mesh, op }),
                    Err(e) => self.outbox.push(ResultMessage::PreviewError {
                        message: e.to_string(),
                    }),
                }
            }
            ControlMessage::ClearPreview => {
                // Previews are stateless one-offs; nothing to tear down.
            }
            ControlMessage::ExportStl { binary, name } => {
                let name = name.unwrap_or_else(|| self.mirror.meta().name.clone());
                let output = self.current_output();
                let meshes: Vec<&anvil_types::TriangleMesh> =
                    output.meshes.iter().map(|(_, mesh, _)| mesh).collect();
                if meshes.is_empty() {
                    self.outbox.push(ResultMessage::Error {
                        message: "no bodies to export".to_string(),
                    });
                } else if binary {
                    let buf = stl::to_binary_stl(&meshes, &name);
                    self.outbox.push(ResultMessage::StlExported {
                        data: BASE64.encode(buf),
                        binary: true,
                    });
                } else {
                    self.outbox.push(ResultMessage::StlExported {
                        data: stl::to_ascii_stl(&meshes, &name),
                        binary: false,
                    });
                }
            }
            ControlMessage::ExportStep { name } => {
                let name = name.unwrap_or_else(|| "export.step".to_string());
                match self.engine.export_step(&self.mirror, &name) {
                    Ok(data) => self.outbox.push(ResultMessage::StepExported { data }),
                    Err(e) => self.outbox.push(ResultMessage::Error {
                        message: e.to_string(),
                    }),
                }
            }
            ControlMessage::ExportJson => {
                self.outbox.push(ResultMessage::JsonExported {
                    content: self.mirror.to_json(),
                });
            }
        }
    }

    /// Advance the clock; runs at most one debounced rebuild.
    pub fn tick(&mut self, now_ms: u64) {
        if self.debounce.fire(now_ms) {
            self.rebuild_now();
        }
    }

    /// True when an invalidation is waiting on its debounce window.
    pub fn rebuild_pending(&self) -> bool {
        self.debounce.pending()
    }

    /// Drain accumulated result messages, in emission order.
    pub fn drain(&mut self) -> Vec<ResultMessage> {
        std::mem::take(&mut self.outbox)
    }

    fn current_output(&mut self) -> RebuildOutput {
        match &self.last_output {
            Some(output) => output.clone(),
            None => {
                let output = self.engine.rebuild(&self.mirror);
                self.last_output = Some(output.clone());
                output
            }
        }
    }

    /// One full rebuild with the spec'd emission order: start, every
    /// sketch-solved, complete, then one mesh per body.
    fn rebuild_now(&mut self) {
        self.outbox.push(ResultMessage::RebuildStart);
        let output = self.engine.rebuild(&self.mirror);

        for solution in &output.sketches {
            self.outbox.push(ResultMessage::SketchSolved {
                sketch_id: solution.sketch,
                points: solution.points.clone(),
                status: solution.outcome,
                plane_transform: solution.plane,
                dof: solution.dof,
            });
        }

        // Write solved positions back into the mirror under a solver
        // origin so the next rebuild starts from the fixpoint. These
        // writes never re-mark the debouncer.
        let writebacks: Vec<_> = output
            .sketches
            .iter()
            .filter(|s| !s.moved.is_empty())
            .collect();
        if !writebacks.is_empty() {
            self.mirror.transact(Origin::Solver, |txn| {
                for solution in &writebacks {
                    for (point, x, y) in &solution.moved {
                        txn.set_sketch_point(solution.sketch, point, *x, *y);
                    }
                }
            });
        }

        self.outbox.push(ResultMessage::RebuildComplete {
            bodies: output.bodies.clone(),
            status: output.statuses.clone(),
            errors: output.errors.clone(),
            ref_index: output.ref_index.clone(),
        });

        for (feature_id, mesh, color) in &output.meshes {
            self.outbox.push(ResultMessage::Mesh {
                feature_id: *feature_id,
                mesh: mesh.clone(),
                color: color.clone(),
            });
        }

        self.last_output = Some(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sync_replies_ready_then_rebuilds_on_tick() {
        let authoring = Document::seeded(SiteId(1), "part");
        let mut worker = WorkerSession::new(SiteId(100));

        worker.handle(
            ControlMessage::InitSync {
                update: authoring.encode_full(),
            },
            0,
        );
        worker.tick(16);

        let messages = worker.drain();
        assert!(matches!(messages[0], ResultMessage::Ready));
        assert!(matches!(messages[1], ResultMessage::RebuildStart));
        assert!(messages
            .iter()
            .any(|m| matches!(m, ResultMessage::RebuildComplete { .. })));
    }

    #[test]
    fn malformed_update_reports_error_without_rebuild() {
        let mut worker = WorkerSession::new(SiteId(100));
        worker.handle(
            ControlMessage::DocumentUpdate {
                update: b"garbage".to_vec(),
            },
            0,
        );
        worker.tick(100);
        let messages = worker.drain();
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ResultMessage::Error { .. }));
    }

    #[test]
    fn burst_of_updates_yields_single_rebuild() {
        let mut authoring = Document::seeded(SiteId(1), "part");
        let mut worker = WorkerSession::new(SiteId(100));
        worker.handle(
            ControlMessage::InitSync {
                update: authoring.encode_full(),
            },
            0,
        );
        worker.tick(16);
        worker.drain();

        // Three edits arriving inside one window.
        for (i, t) in [(1u64, 20u64), (2, 22), (3, 24)] {
            authoring.transact(Origin::User, |txn| {
                txn.set_name(format!("rev {i}"));
            });
            let delta = authoring.encode_since(&worker.mirror().state_vector());
            worker.handle(ControlMessage::DocumentUpdate { update: delta }, t);
        }
        for t in 20..60 {
            worker.tick(t);
        }
        let rebuilds = worker
            .drain()
            .iter()
            .filter(|m| matches!(m, ResultMessage::RebuildStart))
            .count();
        assert_eq!(rebuilds, 1);
    }

    #[test]
    fn export_json_round_trips_the_mirror() {
        let authoring = Document::seeded(SiteId(1), "part");
        let mut worker = WorkerSession::new(SiteId(100));
        worker.handle(
            ControlMessage::InitSync {
                update: authoring.encode_full(),
            },
            0,
        );
        worker.handle(ControlMessage::ExportJson, 1);
        let messages = worker.drain();
        let json = messages
            .iter()
            .find_map(|m| match m {
                ResultMessage::JsonExported { content } => Some(content.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(json, authoring.to_json());
    }
}
