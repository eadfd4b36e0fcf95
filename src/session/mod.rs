//! 扫描会话：摄像头 -> 识别器 的连续采集循环
//!
//! 会话只负责采集线程的生命周期（start/stop/destroy），所有结果以
//! [`AppEvent`] 的形式发送到事件通道，由 UI 线程上的控制器消费。
//! 每次 start 都会分配新的代次（generation），事件携带代次，
//! 停止后迟到的事件据此被丢弃。预览帧不走事件通道，而是写入只保留
//! 最新值的 [`PreviewSender`]，UI线程繁忙时旧帧直接被覆盖。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::{buffer::ConvertBuffer, GrayImage, RgbaImage};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;

use crate::decoder::{ImageDecodeError, QrDecoder, ScanResult};

pub mod camera;
pub mod overlay;

pub use camera::{CameraError, CameraSource, FrameStream, NokhwaCamera};

/// 会话配置
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// 在预览上绘制外接框
    pub highlight_region: bool,
    /// 在预览上绘制二维码轮廓
    pub highlight_outline: bool,
    /// 回调携带结构化结果（含定位点），否则只有文本
    pub detailed_result: bool,
    /// 采集循环的节奏
    pub frame_interval: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            highlight_region: true,
            highlight_outline: true,
            detailed_result: true,
            frame_interval: Duration::from_millis(100),
        }
    }
}

/// 一次检测通知
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub text: String,
    /// 仅在 `detailed_result` 打开时存在
    pub details: Option<ScanResult>,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// 摄像头已就绪
    Started { generation: u64 },
    /// 摄像头打开失败或中途断开
    Unavailable { generation: u64, error: CameraError },
    /// 当前帧识别到了非空内容
    Detected { generation: u64, detection: Detection },
}

/// 工作线程发往 UI 线程的全部事件
#[derive(Debug, Clone)]
pub enum AppEvent {
    Session(SessionEvent),
    ImageDecoded { ticket: u64, result: Result<ScanResult, ImageDecodeError> },
}

pub type EventSender = UnboundedSender<AppEvent>;

/// 一帧预览画面（已叠加高亮）
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub generation: u64,
    pub frame: RgbaImage,
}

pub type PreviewSender = Arc<watch::Sender<Option<PreviewFrame>>>;
pub type PreviewReceiver = watch::Receiver<Option<PreviewFrame>>;

/// 预览槽：只保存最新一帧
pub fn preview_channel() -> (PreviewSender, PreviewReceiver) {
    let (tx, rx) = watch::channel(None);
    (Arc::new(tx), rx)
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("无法启动采集线程: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// 已经在运行，本次调用什么也没做
    AlreadyRunning,
    /// 启动了新的采集，结果稍后以事件返回
    Launched { generation: u64 },
}

pub struct ScanSession {
    source: Arc<dyn CameraSource>,
    decoder: Arc<dyn QrDecoder>,
    options: ScanOptions,
    events: EventSender,
    previews: PreviewSender,
    generation: u64,
    live: Option<u64>,
    running: Arc<AtomicBool>,
    /// 已停止但可能仍在退出中的采集线程，销毁时统一回收
    workers: Vec<JoinHandle<()>>,
}

impl ScanSession {
    pub fn create(
        source: Arc<dyn CameraSource>,
        decoder: Arc<dyn QrDecoder>,
        options: ScanOptions,
        events: EventSender,
        previews: PreviewSender,
    ) -> Self {
        tracing::info!("创建扫描会话: {:?}", options);
        Self {
            source,
            decoder,
            options,
            events,
            previews,
            generation: 0,
            live: None,
            running: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
        }
    }

    /// 当前是否有一代采集处于存活状态（包括正在打开摄像头）
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// 事件是否来自当前存活的那一代
    pub fn accepts(&self, generation: u64) -> bool {
        self.live == Some(generation)
    }

    /// 启动采集循环；不等待摄像头就绪
    pub fn start(&mut self) -> Result<StartOutcome, SessionError> {
        if self.live.is_some() {
            tracing::debug!("会话已在运行，忽略重复启动");
            return Ok(StartOutcome::AlreadyRunning);
        }
        self.reap_finished();

        self.generation += 1;
        let generation = self.generation;
        // 每一代使用独立的运行标志，旧线程不会被新一代误唤醒
        let running = Arc::new(AtomicBool::new(true));
        let ctx = CaptureContext {
            generation,
            source: self.source.clone(),
            decoder: self.decoder.clone(),
            options: self.options.clone(),
            events: self.events.clone(),
            previews: self.previews.clone(),
            running: running.clone(),
        };

        let handle = thread::Builder::new()
            .name(format!("qr-capture-{}", generation))
            .spawn(move || ctx.run())?;

        self.running = running;
        self.workers.push(handle);
        self.live = Some(generation);
        tracing::info!("扫描会话启动，第 {} 代", generation);
        Ok(StartOutcome::Launched { generation })
    }

    /// 停止采集，会话对象保留以便再次启动；重复调用安全
    ///
    /// 只发出停止信号，不等待线程退出：线程可能还卡在打开摄像头上，
    /// 它在下一次检查运行标志时自行退出并释放设备。
    pub fn stop(&mut self) -> bool {
        let was_live = self.live.take().is_some();
        self.running.store(false, Ordering::Release);
        if was_live {
            tracing::info!("扫描会话已停止，第 {} 代", self.generation);
        }
        was_live
    }

    /// 永久释放会话；先隐式停止，再等待所有采集线程退出
    pub fn destroy(mut self) {
        self.stop();
        self.join_all();
        tracing::info!("扫描会话已销毁");
    }

    /// 回收已经结束的线程，不阻塞
    fn reap_finished(&mut self) {
        let (finished, pending): (Vec<_>, Vec<_>) =
            self.workers.drain(..).partition(|h| h.is_finished());
        self.workers = pending;
        for handle in finished {
            Self::join(handle);
        }
    }

    fn join_all(&mut self) {
        for handle in self.workers.drain(..) {
            Self::join(handle);
        }
    }

    fn join(handle: JoinHandle<()>) {
        if handle.join().is_err() {
            tracing::error!("采集线程异常退出");
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        self.join_all();
    }
}

struct CaptureContext {
    generation: u64,
    source: Arc<dyn CameraSource>,
    decoder: Arc<dyn QrDecoder>,
    options: ScanOptions,
    events: EventSender,
    previews: PreviewSender,
    running: Arc<AtomicBool>,
}

impl CaptureContext {
    fn run(self) {
        let generation = self.generation;
        let mut stream = match self.source.open() {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!("摄像头不可用: {}", error);
                self.send(SessionEvent::Unavailable { generation, error });
                return;
            }
        };
        if !self.is_running() {
            return;
        }
        if !self.send(SessionEvent::Started { generation }) {
            return;
        }

        while self.is_running() {
            let frame = match stream.next_frame() {
                Ok(frame) => frame,
                Err(error) => {
                    tracing::warn!("摄像头断开: {}", error);
                    self.send(SessionEvent::Unavailable { generation, error });
                    return;
                }
            };

            let luma: GrayImage = frame.convert();
            let found = match self.decoder.decode(&luma) {
                Ok(found) => found.filter(|r| !r.text.is_empty()),
                Err(e) => {
                    tracing::debug!("本帧识别失败: {}", e);
                    None
                }
            };

            let preview = overlay::render_preview(
                &frame,
                found.as_ref(),
                self.options.highlight_region,
                self.options.highlight_outline,
            );
            self.previews.send_replace(Some(PreviewFrame { generation, frame: preview }));

            if let Some(result) = found {
                let detection = Detection {
                    text: result.text.clone(),
                    details: self.options.detailed_result.then_some(result),
                };
                if !self.send(SessionEvent::Detected { generation, detection }) {
                    return;
                }
            }

            thread::sleep(self.options.frame_interval);
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 通道关闭（UI已退出）时返回 false
    fn send(&self, event: SessionEvent) -> bool {
        self.events.send(AppEvent::Session(event)).is_ok()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::decoder::DecodeError;
    use image::{Rgb, RgbImage};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// 可编排的假摄像头
    #[derive(Default)]
    pub struct FakeCamera {
        pub deny: AtomicBool,
        pub opens: AtomicUsize,
    }

    impl FakeCamera {
        pub fn denying() -> Self {
            Self { deny: AtomicBool::new(true), opens: AtomicUsize::new(0) }
        }
    }

    impl CameraSource for FakeCamera {
        fn open(&self) -> Result<Box<dyn FrameStream>, CameraError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.deny.load(Ordering::SeqCst) {
                return Err(CameraError::Unavailable("permission denied".into()));
            }
            Ok(Box::new(FakeStream))
        }
    }

    /// 打开设备前先睡一段时间，模拟等待权限确认
    pub struct SlowCamera {
        pub delay: Duration,
        pub opens: AtomicUsize,
    }

    impl SlowCamera {
        pub fn new(delay: Duration) -> Self {
            Self { delay, opens: AtomicUsize::new(0) }
        }
    }

    impl CameraSource for SlowCamera {
        fn open(&self) -> Result<Box<dyn FrameStream>, CameraError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok(Box::new(FakeStream))
        }
    }

    struct FakeStream;

    impl FrameStream for FakeStream {
        fn next_frame(&mut self) -> Result<RgbImage, CameraError> {
            Ok(RgbImage::from_pixel(16, 16, Rgb([200, 200, 200])))
        }
    }

    /// 依次返回预设结果，用完后一直返回最后一个
    pub struct ScriptedDecoder {
        script: Mutex<Vec<Option<&'static str>>>,
    }

    impl ScriptedDecoder {
        pub fn new(script: Vec<Option<&'static str>>) -> Self {
            Self { script: Mutex::new(script) }
        }
    }

    impl QrDecoder for ScriptedDecoder {
        fn decode(&self, _frame: &GrayImage) -> Result<Option<ScanResult>, DecodeError> {
            let mut script = self.script.lock().expect("锁中毒");
            let next = if script.len() > 1 { script.remove(0) } else { script.first().copied().flatten() };
            Ok(next.map(ScanResult::text_only))
        }
    }

    pub fn fast_options() -> ScanOptions {
        ScanOptions { frame_interval: Duration::from_millis(1), ..ScanOptions::default() }
    }
}
