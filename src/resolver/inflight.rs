//! Coalescência de consultas em andamento.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;

use crate::types::errors::LookupResult;

type Pending<T> = Mutex<HashMap<String, Arc<OnceCell<LookupResult<T>>>>>;

/// Tabela de consultas em andamento, por chave.
///
/// Chamadas concorrentes com a mesma chave aguardam uma única execução e
/// recebem cópias do mesmo resultado. Se quem está executando for
/// abandonado, o próximo que estiver aguardando assume a execução. A chave
/// sai da tabela quando o último interessado termina ou desiste.
pub struct InFlight<T> {
    pending: Pending<T>,
}

impl<T: Clone> InFlight<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Executa `fetch` para `key`, ou aguarda a execução já em andamento.
    pub async fn run<F, Fut>(&self, key: &str, fetch: F) -> LookupResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LookupResult<T>>,
    {
        let cell = {
            let mut pending = lock(&self.pending);
            match pending.get(key) {
                Some(cell) if !cell.initialized() => cell.clone(),
                _ => {
                    let cell = Arc::new(OnceCell::new());
                    pending.insert(key.to_string(), cell.clone());
                    cell
                }
            }
        };

        let guard = Registration {
            pending: &self.pending,
            key,
            cell,
        };

        let result = guard.cell.get_or_init(fetch).await.clone();
        result
    }

    /// Número de chaves em andamento.
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for InFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(pending: &Pending<T>) -> MutexGuard<'_, HashMap<String, Arc<OnceCell<LookupResult<T>>>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Participação de uma chamada em uma chave; ao sair (normalmente ou por
/// cancelamento) remove a chave se ninguém mais depende dela.
struct Registration<'a, T> {
    pending: &'a Pending<T>,
    key: &'a str,
    cell: Arc<OnceCell<LookupResult<T>>>,
}

impl<T> Drop for Registration<'_, T> {
    fn drop(&mut self) {
        let mut pending = lock(self.pending);

        let Some(current) = pending.get(self.key) else {
            return;
        };
        if !Arc::ptr_eq(current, &self.cell) {
            return;
        }

        // Tabela + esta chamada: ninguém mais aguarda a célula
        let alone = Arc::strong_count(&self.cell) <= 2;
        if self.cell.initialized() || alone {
            pending.remove(self.key);
        }
    }
}
