use crate::application::services::match_service::MatchService;
use crate::domain::value_objects::UserId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// プロフィール編集コラボレーターが発行するタグ変更イベント。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsChanged {
    pub owner_id: UserId,
}

/// タグ変更の発行口。発行の失敗は呼び出し元のリクエストを失敗させない。
#[derive(Clone)]
pub struct TagEventSender {
    tx: mpsc::Sender<TagsChanged>,
}

impl TagEventSender {
    /// 満杯・停止済みチャネルへの発行は警告ログだけ残して捨てる。
    /// 取りこぼしは次の全件再計算で埋まる。
    pub fn emit(&self, event: TagsChanged) {
        if let Err(err) = self.tx.try_send(event) {
            tracing::warn!(error = %err, "dropped TagsChanged event");
        }
    }
}

pub fn tag_event_channel(capacity: usize) -> (TagEventSender, mpsc::Receiver<TagsChanged>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (TagEventSender { tx }, rx)
}

/// タグ変更を受けて差分再計算を回すワーカー。失敗はログと統計にだけ現れ、
/// イベントの発行元には伝播しない。チャネルが閉じると終了する。
pub fn spawn_recompute_worker(
    service: Arc<MatchService>,
    mut rx: mpsc::Receiver<TagsChanged>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match service.incremental_update(&event.owner_id).await {
                Ok(stats) => {
                    tracing::info!(
                        owner = %event.owner_id,
                        examined = stats.examined,
                        created = stats.created,
                        updated = stats.updated,
                        removed = stats.removed,
                        failed = stats.failed,
                        "recompute worker finished incremental update"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        owner = %event.owner_id,
                        error = %err,
                        "recompute worker update failed"
                    );
                }
            }
        }
    })
}
