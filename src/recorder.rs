use crate::capture::clock::ClockSampler;
use crate::capture::{CaptureConfig, CaptureSession, FailedSession, SessionReport, Tick};
use crate::engine::trace::Trace;
use crate::engine::{Avatar, Transport};
use crate::model::song::SongMetadata;
use crate::writer::ChartWriter;
use anyhow::{anyhow, bail};
use log::{debug, info, warn};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

enum ControlMsg {
    Stop,
}

type SessionResult = Result<SessionReport, FailedSession>;

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub capture: CaptureConfig,
    /// Directory the finished chart is written to.
    pub output_dir: PathBuf,
    /// Pace frames against the wall clock. Trace replays run unpaced.
    pub realtime: bool,
    /// Seconds to wait before the transport starts.
    pub delay_start: u64,
    pub save_trace: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug)]
pub struct Recorder<T: Transport, A: Avatar, W: ChartWriter> {
    config: RecorderConfig,
    writer: Arc<W>,
    metadata: Mutex<Option<SongMetadata>>,
    stage: Mutex<Option<(T, A)>>,
    control_tx: Mutex<Option<Sender<ControlMsg>>>,
    worker_handle: Mutex<Option<JoinHandle<SessionResult>>>,
}

impl<T, A, W> Recorder<T, A, W>
where
    T: Transport + 'static,
    A: Avatar + 'static,
    W: ChartWriter + Send + Sync + 'static,
{
    pub fn new(transport: T, avatar: A, writer: W, config: RecorderConfig) -> Self {
        Self {
            config,
            writer: Arc::new(writer),
            metadata: Mutex::new(None),
            stage: Mutex::new(Some((transport, avatar))),
            control_tx: Mutex::new(None),
            worker_handle: Mutex::new(None),
        }
    }

    pub fn load_metadata(&self, metadata: SongMetadata) -> anyhow::Result<()> {
        metadata.validate()?;

        let Ok(mut lock) = self.metadata.lock() else {
            bail!("Failed to lock the song metadata..!");
        };

        info!(
            "Loaded song: '{}' by {} at {} BPM..!",
            metadata.title, metadata.artist, metadata.bpm
        );
        *lock = Some(metadata);

        Ok(())
    }

    /// Start recording. With `join` the call blocks until the session is
    /// written and returns its report; otherwise the report is returned by [`Recorder::stop`].
    pub fn record(&self, join: bool) -> anyhow::Result<Option<SessionReport>> {
        {
            let Ok(guard) = self.worker_handle.lock() else {
                bail!("Failed to lock worker handle..!")
            };

            if guard.is_some() {
                bail!("Recording already running..!")
            }
        }

        let metadata = {
            let Ok(lock) = self.metadata.lock() else {
                bail!("Failed to lock the song metadata..!")
            };

            match lock.as_ref() {
                Some(metadata) => metadata.clone(),
                None => bail!("No song loaded..!"),
            }
        };

        let (mut transport, mut avatar) = {
            let Ok(mut lock) = self.stage.lock() else {
                bail!("Failed to lock the transport..!")
            };

            match lock.take() {
                Some(stage) => stage,
                None => bail!("Transport was already used by an earlier recording..!"),
            }
        };

        let mut session = CaptureSession::new(metadata, self.config.capture)?;
        let writer = Arc::clone(&self.writer);
        let (tx, rx) = mpsc::channel::<ControlMsg>();

        {
            let Ok(mut ctl) = self.control_tx.lock() else {
                bail!("Failed to lock control_tx..!")
            };

            *ctl = Some(tx);
        }

        let config = self.config.clone();
        let handle = thread::spawn(move || {
            let ctrl_rx = rx;

            #[cfg(all(target_os = "windows", feature = "wininput"))]
            {
                use windows::Win32::System::Threading::{
                    GetCurrentThread, SetThreadPriority, THREAD_PRIORITY_HIGHEST,
                };
                unsafe {
                    let h = GetCurrentThread();
                    let ok = SetThreadPriority(h, THREAD_PRIORITY_HIGHEST);

                    if ok.is_ok() {
                        debug!("Capture thread priority set to HIGHEST..!");
                    } else {
                        warn!("Failed to set capture thread priority..!");
                    }
                }
            }

            let sleeper = SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);

            if config.delay_start > 0 {
                info!("Starting in {} seconds..!", config.delay_start);
                sleeper.sleep(Duration::from_secs(config.delay_start));
            }

            let frame_period = config.capture.frame_period;
            let period = Duration::from_secs_f64(frame_period);
            let mut sampler = ClockSampler::new(frame_period);
            let mut trace = config.save_trace.as_ref().map(|_| Trace::new(frame_period));

            transport.play();
            session.start();

            let start = Instant::now();
            let mut next_frame = start;
            let mut frames: u64 = 0;

            loop {
                if ctrl_rx.try_recv().is_ok() {
                    warn!(
                        "Recording stopped via control message after {:.3} seconds..!",
                        start.elapsed().as_secs_f64()
                    );
                    session.cancel();
                    break;
                }

                transport.advance();
                let frame = sampler.sample(&transport);
                let state = avatar.poll();
                frames += 1;

                if frame.playing {
                    if let Some(trace) = trace.as_mut() {
                        trace.push(frame.time, &state);
                    }
                }

                if config.verbose && state.keys.any() {
                    info!(
                        "{:30} | at {:>9.3}s | y: {:>5.2}",
                        format!("{:?}", state.keys),
                        frame.time,
                        state.y
                    );
                }

                if let Tick::Stopped(_) = session.tick(&frame, &state) {
                    break;
                }

                if config.realtime {
                    next_frame += period;
                    let now = Instant::now();
                    if next_frame > now {
                        sleeper.sleep(next_frame - now);
                    } else {
                        // Running behind; don't try to catch up with a burst of frames.
                        next_frame = now;
                    }
                }
            }

            debug!("Capture loop ran {} frames..!", frames);

            if let (Some(trace), Some(path)) = (trace, config.save_trace.as_ref()) {
                match trace.save(path) {
                    Ok(()) => info!(
                        "Saved input trace of {} frames to {}..!",
                        trace.frames.len(),
                        path.display()
                    ),
                    Err(why) => warn!("Failed to save input trace: {}", why),
                }
            }

            session.finalize(writer.as_ref(), &config.output_dir)
        });

        if join {
            let result = handle
                .join()
                .map_err(|_| anyhow!("Capture thread panicked..!"))?;
            self.clear_control();
            return Ok(Some(result?));
        }

        let Ok(mut wh) = self.worker_handle.lock() else {
            bail!("Failed to lock worker handle..!")
        };

        *wh = Some(handle);

        Ok(None)
    }

    /// Stop a recording started without `join`, returning its report once the chart is written.
    pub fn stop(&self) -> anyhow::Result<Option<SessionReport>> {
        let tx = {
            let Ok(mut lock) = self.control_tx.lock() else {
                bail!("Failed to lock control_tx..!")
            };
            lock.take()
        };

        if let Some(tx) = tx {
            let _ = tx.send(ControlMsg::Stop);
        } else {
            bail!("No worker is recording..!")
        }

        self.join_worker()
    }

    /// Wait for a recording started without `join` to finish on its own.
    pub fn wait(&self) -> anyhow::Result<Option<SessionReport>> {
        let report = self.join_worker()?;
        self.clear_control();
        Ok(report)
    }

    fn join_worker(&self) -> anyhow::Result<Option<SessionReport>> {
        let handle = {
            let Ok(mut lock) = self.worker_handle.lock() else {
                bail!("Failed to lock worker_handle..!")
            };
            lock.take()
        };

        let Some(handle) = handle else {
            return Ok(None);
        };

        let result = handle
            .join()
            .map_err(|_| anyhow!("Capture thread panicked..!"))?;
        debug!("Capture thread joined..!");
        info!("Stopped capture thread..!");

        Ok(Some(result?))
    }

    fn clear_control(&self) {
        if let Ok(mut lock) = self.control_tx.lock() {
            lock.take();
        }
    }
}
