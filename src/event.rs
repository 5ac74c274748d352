use tokio::sync::mpsc;

/// User-facing notifications emitted outside the normal request/response flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  /// Connectivity was probed and found unavailable. Hosts typically render
  /// this as a banner or toast.
  ConnectionError,
}

/// Sending half of the notice channel, handed to the connectivity monitor.
#[derive(Clone)]
pub struct Notifier {
  tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
  /// Emit a notice. Dropped silently if no one is listening.
  pub fn notify(&self, notice: Notice) {
    let _ = self.tx.send(notice);
  }
}

/// Receiving half of the notice channel, drained by the host UI.
pub struct NoticeStream {
  rx: mpsc::UnboundedReceiver<Notice>,
}

impl NoticeStream {
  /// Receive the next notice, waiting until one arrives.
  pub async fn next(&mut self) -> Option<Notice> {
    self.rx.recv().await
  }

  /// Receive a notice if one is already queued, without waiting.
  pub fn try_next(&mut self) -> Option<Notice> {
    self.rx.try_recv().ok()
  }
}

/// Create a connected notifier/stream pair.
pub fn notice_channel() -> (Notifier, NoticeStream) {
  let (tx, rx) = mpsc::unbounded_channel();
  (Notifier { tx }, NoticeStream { rx })
}
