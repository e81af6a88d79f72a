//! The safe-frame scaling engine.
//!
//! [`ScaleEngine`] is the single authoritative source of current safe-frame
//! geometry: it caches viewport measurements, recomputes scale state on
//! debounced resize events, and notifies registered listeners. One instance
//! is constructed at application startup, owned by the composition root, and
//! shared by handle.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::geometry::{self, ScaleResult, Viewport, DEFAULT_PIXEL_RATIO};
use crate::platform::{FontSink, PlatformProbe, ViewportSource};

/// Quiet window after the last resize event before recomputation fires.
///
/// Resize events can arrive at high frequency during a window drag; the
/// debounce collapses each burst into one recomputation and one notification
/// pass.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Callback invoked after a debounced resize recomputation.
///
/// Listeners are registered by `Arc` identity: registering the same `Arc`
/// twice coalesces into a single registration.
pub type ResizeCallback = dyn Fn() + Send + Sync;

/// Collaborators injected from the host environment.
pub struct HostEnv {
    /// Platform capability probe selecting the measurement strategy.
    pub probe: Arc<dyn PlatformProbe>,
    /// Raw viewport measurement source.
    pub viewport: Arc<dyn ViewportSource>,
    /// Root font-size side channel.
    pub font_sink: Arc<dyn FontSink>,
    /// Resize event stream from the host window system.
    pub resize_events: mpsc::UnboundedReceiver<()>,
}

#[derive(Clone)]
struct ListenerEntry {
    id: u64,
    callback: Arc<ResizeCallback>,
}

struct EngineInner {
    cached_width: Option<f64>,
    cached_height: Option<f64>,
    /// Last computed font-scale percentage.
    scale_ratio: f64,
    listeners: Vec<ListenerEntry>,
    next_listener_id: u64,
    /// Bumped on every resize event; a pending timer only fires if its epoch
    /// is still current.
    epoch: u64,
    debounce: Option<AbortHandle>,
    pump: Option<AbortHandle>,
    destroyed: bool,
}

struct Shared {
    probe: Arc<dyn PlatformProbe>,
    viewport: Arc<dyn ViewportSource>,
    font_sink: Arc<dyn FontSink>,
    inner: Mutex<EngineInner>,
}

/// Viewport-to-safe-frame scaling engine.
///
/// Cheap to clone; clones share the same state. Lifecycle is one-way:
/// `Active` until [`ScaleEngine::destroy`], after which reads keep returning
/// best-effort values while mutations and registrations become no-ops.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use safeframe_core::{FixedProbe, FixedViewport, HostEnv, NoopFontSink, ScaleEngine, Viewport};
/// use tokio::sync::mpsc;
///
/// # async fn run() {
/// let (resize_tx, resize_rx) = mpsc::unbounded_channel();
/// let engine = ScaleEngine::new(HostEnv {
///     probe: Arc::new(FixedProbe { tv: true, desktop_browser: false }),
///     viewport: Arc::new(FixedViewport::new(Viewport { width: 1920.0, height: 1080.0 })),
///     font_sink: Arc::new(NoopFontSink),
///     resize_events: resize_rx,
/// });
///
/// let info = engine.scale_info();
/// assert!(info.width <= 1920.0);
///
/// // Host window system forwards raw resize events:
/// resize_tx.send(()).ok();
/// # }
/// ```
#[derive(Clone)]
pub struct ScaleEngine {
    shared: Arc<Shared>,
}

/// Handle returned by [`ScaleEngine::add_resize_listener`].
///
/// Dropping the guard leaves the registration in place;
/// [`ListenerGuard::unregister`] removes exactly the associated callback.
/// Guards returned after destruction are inert.
#[must_use = "dropping the guard without calling unregister leaves the listener registered"]
pub struct ListenerGuard {
    shared: Weak<Shared>,
    id: u64,
}

impl ListenerGuard {
    fn inert() -> Self {
        Self {
            shared: Weak::new(),
            id: 0,
        }
    }

    /// Remove the associated listener. Safe to call at any point in the
    /// engine lifecycle, including after destruction.
    pub fn unregister(self) {
        if let Some(shared) = self.shared.upgrade() {
            let mut inner = lock(&shared.inner);
            inner.listeners.retain(|entry| entry.id != self.id);
        }
    }
}

fn lock(mutex: &Mutex<EngineInner>) -> MutexGuard<'_, EngineInner> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl ScaleEngine {
    /// Create the engine, compute the initial scale state, write the initial
    /// font percentage, and subscribe to the host's resize events.
    ///
    /// Exactly one subscription task is spawned for the lifetime of the
    /// engine; [`ScaleEngine::destroy`] tears it down.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime context.
    #[must_use]
    pub fn new(host: HostEnv) -> Self {
        let HostEnv {
            probe,
            viewport,
            font_sink,
            resize_events,
        } = host;

        let engine = Self {
            shared: Arc::new(Shared {
                probe,
                viewport,
                font_sink,
                inner: Mutex::new(EngineInner {
                    cached_width: None,
                    cached_height: None,
                    scale_ratio: 0.0,
                    listeners: Vec::new(),
                    next_listener_id: 1,
                    epoch: 0,
                    debounce: None,
                    pump: None,
                    destroyed: false,
                }),
            }),
        };

        let _ = engine.update_scale_ratio();

        let pump_engine = engine.clone();
        let mut events = resize_events;
        let pump = tokio::spawn(async move {
            while events.recv().await.is_some() {
                pump_engine.handle_resize();
            }
        });
        lock(&engine.shared.inner).pump = Some(pump.abort_handle());

        let ratio = engine.scale_ratio();
        tracing::info!("scale engine started with scale ratio {ratio}");
        engine
    }

    /// Current effective viewport width, cached until the next resize event.
    #[must_use]
    pub fn real_width(&self) -> f64 {
        if let Some(width) = lock(&self.shared.inner).cached_width {
            return width;
        }
        let measured = self.measure().width;
        *lock(&self.shared.inner)
            .cached_width
            .get_or_insert(measured)
    }

    /// Current effective viewport height, cached until the next resize event.
    #[must_use]
    pub fn real_height(&self) -> f64 {
        if let Some(height) = lock(&self.shared.inner).cached_height {
            return height;
        }
        let measured = self.measure().height;
        *lock(&self.shared.inner)
            .cached_height
            .get_or_insert(measured)
    }

    /// Last computed font-scale percentage (150 at the reference
    /// resolution).
    #[must_use]
    pub fn scale_ratio(&self) -> f64 {
        lock(&self.shared.inner).scale_ratio
    }

    /// Convert a design-space size to pixels.
    ///
    /// The multiplier is the font-scale *percentage*, not a 0-1 fraction:
    /// at the reference resolution `to_px(1.0)` is 150.
    #[must_use]
    pub fn to_px(&self, size: f64) -> f64 {
        size * self.scale_ratio()
    }

    /// Compute the current safe-frame geometry. Pure given the current
    /// cache: repeated calls without an intervening resize return identical
    /// results.
    #[must_use]
    pub fn scale_info(&self) -> ScaleResult {
        geometry::scale_info(self.current_viewport())
    }

    /// Recompute the scale ratio, write the font-scale percentage to the
    /// host sink, and return the refreshed geometry.
    ///
    /// After destruction this has no side effects and returns the
    /// best-effort [`ScaleEngine::scale_info`].
    #[must_use = "returns the refreshed geometry"]
    pub fn update_scale_ratio(&self) -> ScaleResult {
        let viewport = self.current_viewport();
        let percent = {
            let mut inner = lock(&self.shared.inner);
            if inner.destroyed {
                None
            } else {
                let percent = geometry::font_scale(viewport);
                inner.scale_ratio = percent;
                Some(percent)
            }
        };
        if let Some(percent) = percent {
            self.shared.font_sink.set_font_size(&format!("{percent}%"));
            tracing::debug!("font scale applied: {percent}%");
        }
        self.scale_info()
    }

    /// Recompute and apply the font scale. Alias for
    /// [`ScaleEngine::update_scale_ratio`].
    #[must_use = "returns the refreshed geometry"]
    pub fn scale_font(&self) -> ScaleResult {
        self.update_scale_ratio()
    }

    /// Register a callback for debounced resize notifications.
    ///
    /// Registrations are deduplicated by `Arc` identity: passing a clone of
    /// an already registered callback warns and returns a guard for the
    /// existing registration. After destruction an inert guard is returned
    /// and the callback is never invoked.
    pub fn add_resize_listener(&self, callback: Arc<ResizeCallback>) -> ListenerGuard {
        let mut inner = lock(&self.shared.inner);
        if inner.destroyed {
            return ListenerGuard::inert();
        }

        if let Some(existing) = inner
            .listeners
            .iter()
            .find(|entry| Arc::ptr_eq(&entry.callback, &callback))
        {
            tracing::warn!("resize listener already registered, coalescing duplicate");
            return ListenerGuard {
                shared: Arc::downgrade(&self.shared),
                id: existing.id,
            };
        }

        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push(ListenerEntry { id, callback });
        ListenerGuard {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    /// Number of currently registered resize listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        lock(&self.shared.inner).listeners.len()
    }

    /// Whether [`ScaleEngine::destroy`] has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        lock(&self.shared.inner).destroyed
    }

    /// Entry point for a raw resize event.
    ///
    /// Invalidates the measurement cache immediately, so synchronous reads
    /// during the debounce window see fresh values, and re-arms the debounce
    /// timer. Usually driven by the subscription task; hosts that deliver
    /// events by direct call may invoke it themselves.
    pub fn handle_resize(&self) {
        let epoch = {
            let mut inner = lock(&self.shared.inner);
            if inner.destroyed {
                return;
            }
            inner.cached_width = None;
            inner.cached_height = None;
            inner.epoch += 1;
            if let Some(timer) = inner.debounce.take() {
                timer.abort();
            }
            inner.epoch
        };
        tracing::debug!("resize observed, measurement cache invalidated (epoch {epoch})");

        let engine = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(RESIZE_DEBOUNCE).await;
            engine.debounce_fired(epoch);
        });

        let mut inner = lock(&self.shared.inner);
        if inner.destroyed || inner.epoch != epoch {
            timer.abort();
        } else {
            inner.debounce = Some(timer.abort_handle());
        }
    }

    /// Tear the engine down. Idempotent.
    ///
    /// Cancels any pending debounce timer, unsubscribes from the host's
    /// resize events, clears the listener registry and measurement cache.
    /// Reads keep working afterwards; mutations and registrations become
    /// no-ops.
    pub fn destroy(&self) {
        let (debounce, pump) = {
            let mut inner = lock(&self.shared.inner);
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            inner.cached_width = None;
            inner.cached_height = None;
            inner.listeners.clear();
            (inner.debounce.take(), inner.pump.take())
        };
        if let Some(timer) = debounce {
            timer.abort();
        }
        if let Some(task) = pump {
            task.abort();
        }
        tracing::info!("scale engine destroyed");
    }

    /// Raw measurement using the platform strategy.
    ///
    /// TV and desktop-browser runtimes report a trustworthy inner size.
    /// Elsewhere outer and inner window sizes can diverge (embedded or
    /// windowed contexts), so take the per-axis minimum.
    fn measure(&self) -> Viewport {
        let inner_size = self.shared.viewport.inner_size();
        if self.shared.probe.is_tv() || self.shared.probe.is_desktop_browser() {
            inner_size
        } else {
            let outer_size = self.shared.viewport.outer_size();
            Viewport {
                width: inner_size.width.min(outer_size.width) * DEFAULT_PIXEL_RATIO,
                height: inner_size.height.min(outer_size.height) * DEFAULT_PIXEL_RATIO,
            }
        }
    }

    fn current_viewport(&self) -> Viewport {
        Viewport {
            width: self.real_width(),
            height: self.real_height(),
        }
    }

    fn debounce_fired(&self, epoch: u64) {
        {
            let mut inner = lock(&self.shared.inner);
            if inner.destroyed || inner.epoch != epoch {
                return;
            }
            inner.debounce = None;
        }
        let _ = self.update_scale_ratio();
        self.notify_listeners();
    }

    /// Invoke all registered listeners in insertion order.
    ///
    /// Works on a snapshot so listeners may unregister themselves (or each
    /// other) mid-pass. A panicking listener is logged and permanently
    /// evicted; remaining listeners still run.
    fn notify_listeners(&self) {
        let snapshot: Vec<ListenerEntry> = {
            let inner = lock(&self.shared.inner);
            if inner.destroyed {
                return;
            }
            inner.listeners.clone()
        };

        for entry in snapshot {
            let still_registered = lock(&self.shared.inner)
                .listeners
                .iter()
                .any(|current| current.id == entry.id);
            if !still_registered {
                continue;
            }

            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (entry.callback)())) {
                let message = panic_message(payload.as_ref());
                tracing::error!("resize listener {} panicked, evicting it: {message}", entry.id);
                lock(&self.shared.inner)
                    .listeners
                    .retain(|current| current.id != entry.id);
            }
        }
    }
}
