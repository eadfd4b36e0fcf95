//! 程序入口：初始化日志、加载 Slint UI，并绑定扫描控制器

use std::{cell::RefCell, path::PathBuf, rc::Rc, sync::Arc};

use slint::{ComponentHandle, Rgba8Pixel, SharedPixelBuffer};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::fmt::SubscriberBuilder;

slint::include_modules!();

use erweima_saomiao::utils::clipboard::copy_to_clipboard;
use erweima_saomiao::vm::bridge::*;
use erweima_saomiao::{
    preview_channel, AppEvent, NokhwaCamera, PreviewReceiver, Refresh, RxingDecoder, ScanConfig,
    ScanController, ViewModel,
};

/// VM桥接器：管理UI与扫描控制器的交互
struct ViewModelBridge {
    controller: Rc<RefCell<ScanController>>,
}

impl ViewModelBridge {
    /// 创建新的VM桥接器并绑定所有回调
    fn new(app_window: &AppWindow, controller: Rc<RefCell<ScanController>>) -> Self {
        let bridge = Self { controller };
        bridge.setup_callbacks(app_window);
        bridge
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        let controller = self.controller.clone();

        // === 启动/停止摄像头 ===
        {
            let controller = controller.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_toggle_camera(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    controller.borrow_mut().toggle_camera();
                    Self::render(&app_window, &controller);
                }
            });
        }

        // === 上传图片 ===
        {
            let controller = controller.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_upload_image(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    if let Some(path) = Self::show_image_dialog() {
                        controller.borrow_mut().upload_image(path);
                    }
                    Self::render(&app_window, &controller);
                }
            });
        }

        // === 清除结果 ===
        {
            let controller = controller.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_clear_result(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    controller.borrow_mut().clear();
                    Self::render(&app_window, &controller);
                }
            });
        }

        // === 复制结果 ===
        {
            let controller = controller.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_copy_result(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    controller.borrow_mut().copy_decoded(copy_to_clipboard);
                    Self::render(&app_window, &controller);
                }
            });
        }

        // === 打开链接 ===
        {
            let controller = controller.clone();
            app_window.on_open_link(move || {
                controller.borrow().open_link(|url| open::that(url));
            });
        }
    }

    /// 初始化UI状态
    fn initialize_ui(&self, app_window: &AppWindow) {
        app_window.set_has_frame(false);
        Self::render(app_window, &self.controller);
    }

    /// 在UI线程上消费工作线程发来的事件
    fn spawn_event_pump(
        &self,
        app_window: &AppWindow,
        mut events: UnboundedReceiver<AppEvent>,
    ) -> Result<(), slint::EventLoopError> {
        let controller = self.controller.clone();
        let app_window_weak = app_window.as_weak();
        slint::spawn_local(async move {
            while let Some(event) = events.recv().await {
                let refresh = controller.borrow_mut().handle_event(event);
                let Some(app_window) = app_window_weak.upgrade() else {
                    break;
                };
                if refresh == Refresh::State {
                    Self::render(&app_window, &controller);
                }
            }
            tracing::info!("事件通道已关闭");
        })?;
        Ok(())
    }

    /// 只显示预览槽里的最新一帧，来不及显示的帧直接跳过
    fn spawn_preview_pump(
        &self,
        app_window: &AppWindow,
        mut previews: PreviewReceiver,
    ) -> Result<(), slint::EventLoopError> {
        let controller = self.controller.clone();
        let app_window_weak = app_window.as_weak();
        slint::spawn_local(async move {
            while previews.changed().await.is_ok() {
                let Some(preview) = previews.borrow_and_update().clone() else {
                    continue;
                };
                if !controller.borrow().accepts_preview(preview.generation) {
                    continue;
                }
                let Some(app_window) = app_window_weak.upgrade() else {
                    break;
                };
                let (width, height) = preview.frame.dimensions();
                let buffer =
                    SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(preview.frame.as_raw(), width, height);
                app_window.set_video_frame(slint::Image::from_rgba8(buffer));
                app_window.set_has_frame(true);
            }
            tracing::info!("预览通道已关闭");
        })?;
        Ok(())
    }

    /// 把控制器状态投影到窗口属性
    fn render(app_window: &AppWindow, controller: &Rc<RefCell<ScanController>>) {
        let vm = ViewModel::from_state(controller.borrow().state());
        let (r, g, b) = vm.status_color;
        app_window.set_status_text(vm.status_text.into());
        app_window.set_status_color(slint::Color::from_rgb_u8(r, g, b));
        app_window.set_camera_active(vm.camera_active);
        app_window.set_toggle_label(vm.toggle_label.into());
        app_window.set_output_text(vm.output_text.into());
        app_window.set_has_result(vm.has_result);
        app_window.set_error_text(vm.error_text.into());
        app_window.set_can_copy(vm.can_copy);
        app_window.set_can_open_link(vm.can_open_link);
        app_window.set_link_caption(vm.link_caption.into());
        app_window.set_region_caption(vm.region_caption.into());
        app_window.set_selected_file(vm.selected_file.into());
    }

    /// 显示图片选择对话框
    fn show_image_dialog() -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter(FILTER_IMAGES, IMAGE_EXTENSIONS)
            .set_title(DIALOG_PICK_IMAGE)
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了图片: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了图片选择");
                None
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config_result = ScanConfig::resolve();
    let config = config_result.as_ref().cloned().unwrap_or_default();

    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(config.tracing_level())
        .try_init();
    if let Err(e) = &config_result {
        tracing::warn!("配置文件无效，使用默认配置: {}", e);
    }

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let (previews_tx, previews_rx) = preview_channel();
    let controller = Rc::new(RefCell::new(ScanController::new(
        Arc::new(NokhwaCamera),
        Arc::new(RxingDecoder::default()),
        config.scan_options(),
        events_tx,
        previews_tx,
    )));

    let app = AppWindow::new()?;
    app.set_window_title(WINDOW_TITLE.into());

    // 创建VM桥接器并绑定UI回调
    let bridge = ViewModelBridge::new(&app, controller.clone());
    bridge.initialize_ui(&app);
    bridge.spawn_event_pump(&app, events_rx)?;
    bridge.spawn_preview_pump(&app, previews_rx)?;

    tracing::info!("应用启动成功，UI已初始化");
    app.run()?;

    // 窗口关闭后释放摄像头
    controller.borrow_mut().shutdown();
    Ok(())
}
