use crate::error::Result;
use crate::hierarchy::relations_above;
use crate::zookie::{Zookie, ZookieManager};
use futures::stream::{FuturesUnordered, StreamExt};
use rebac_cache::DecisionCache;
use rebac_models::{Subject, TupleKey, USER_TYPE};
use rebac_store::TupleStore;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Maximum traversal depth; nodes past the bound are denied unexplored.
    pub max_depth: u32,
    /// How many graph nodes are probed concurrently.
    pub fanout: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            fanout: 4,
        }
    }
}

/// Permission check request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckRequest {
    #[validate(length(min = 1, max = 256))]
    pub namespace: String,
    #[validate(length(min = 1, max = 256))]
    pub object_id: String,
    #[validate(length(min = 1, max = 256))]
    pub relation: String,
    #[validate(length(min = 1, max = 256))]
    pub user_id: String,
    #[serde(default = "default_user_type")]
    #[validate(length(min = 1, max = 256))]
    pub user_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zookie: Option<String>,
}

fn default_user_type() -> String {
    USER_TYPE.to_string()
}

/// Permission check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub allowed: bool,
    pub zookie: Zookie,
}

/// One node of the traversal: a (namespace, object, relation) to test
/// against the fixed original subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Node {
    namespace: String,
    object_id: String,
    relation: String,
}

struct NodeVisit {
    node: Node,
    depth: u32,
    hit: bool,
    usersets: Vec<rebac_models::UsersetRef>,
}

/// Recursive evaluator over the tuple graph: direct match, hierarchical
/// inheritance and userset expansion, short-circuiting on the first grant.
pub struct PermissionChecker {
    store: Arc<dyn TupleStore>,
    cache: DecisionCache,
    zookies: Arc<ZookieManager>,
    config: CheckerConfig,
}

impl PermissionChecker {
    pub fn new(
        store: Arc<dyn TupleStore>,
        cache: DecisionCache,
        zookies: Arc<ZookieManager>,
        config: CheckerConfig,
    ) -> Self {
        Self {
            store,
            cache,
            zookies,
            config,
        }
    }

    /// Decide whether the subject holds the relation on the object.
    ///
    /// The response zookie is the check's own invocation time. An input
    /// zookie makes cache entries stamped before it unusable, so a decision
    /// can never predate a write the caller has already seen.
    pub async fn check(&self, request: &CheckRequest) -> Result<CheckResponse> {
        let subject = Subject::from_parts(&request.user_type, &request.user_id)?;
        let check_key = TupleKey::new(
            &request.namespace,
            &request.object_id,
            &request.relation,
            subject,
        );
        let min_stamp = request.zookie.as_deref().map(Zookie::parse).transpose()?;
        let stamp = self.zookies.now_micros();

        match self.cache.get(&check_key, min_stamp).await {
            Ok(Some(decision)) => {
                return Ok(CheckResponse {
                    allowed: decision.allowed,
                    zookie: Zookie::encode(stamp),
                });
            }
            Ok(None) => {}
            // Cache unavailability never fails a check; fall through to the
            // store as a plain miss.
            Err(e) => tracing::warn!("Decision cache read failed, treating as miss: {}", e),
        }

        let allowed = self.evaluate(&check_key).await?;

        if let Err(e) = self.cache.put(&check_key, allowed, stamp).await {
            tracing::warn!("Decision cache populate failed: {}", e);
        }

        Ok(CheckResponse {
            allowed,
            zookie: Zookie::encode(stamp),
        })
    }

    /// Breadth-first traversal with an explicit work queue. Sibling nodes
    /// are probed concurrently up to the configured fanout and joined on
    /// the first grant; dropping the in-flight set cancels the rest.
    async fn evaluate(&self, check: &TupleKey) -> Result<bool> {
        let subject = &check.subject;
        let root = Node {
            namespace: check.namespace.clone(),
            object_id: check.object_id.clone(),
            relation: check.relation.clone(),
        };

        // A node already visited contributes no new truth; this makes
        // cycles and diamonds terminate.
        let mut visited: HashSet<Node> = HashSet::new();
        visited.insert(root.clone());
        let mut pending: VecDeque<(Node, u32)> = VecDeque::from([(root, 0)]);
        let mut inflight = FuturesUnordered::new();
        let mut depth_exhausted = false;
        let fanout = self.config.fanout.max(1);

        loop {
            while inflight.len() < fanout {
                match pending.pop_front() {
                    Some((node, depth)) => inflight.push(self.visit(node, depth, subject)),
                    None => break,
                }
            }

            let Some(outcome) = inflight.next().await else {
                break;
            };
            let visit = outcome?;

            if visit.hit {
                return Ok(true);
            }

            let child_depth = visit.depth + 1;
            let mut children: Vec<Node> = relations_above(&visit.node.relation)
                .into_iter()
                .map(|relation| Node {
                    namespace: visit.node.namespace.clone(),
                    object_id: visit.node.object_id.clone(),
                    relation: relation.to_string(),
                })
                .collect();
            children.extend(visit.usersets.into_iter().map(|r| Node {
                namespace: r.namespace,
                object_id: r.object_id,
                relation: r.relation,
            }));

            for child in children {
                if !visited.insert(child.clone()) {
                    continue;
                }
                if child_depth > self.config.max_depth {
                    depth_exhausted = true;
                    continue;
                }
                pending.push_back((child, child_depth));
            }
        }

        if depth_exhausted {
            tracing::warn!(
                "Check {} exceeded depth bound {}; unexplored branches denied",
                check,
                self.config.max_depth
            );
        }
        Ok(false)
    }

    /// Probe one node: direct match against the subject, then collect the
    /// userset referents granting this relation for later expansion.
    async fn visit(&self, node: Node, depth: u32, subject: &Subject) -> Result<NodeVisit> {
        if self
            .store
            .find_direct(&node.namespace, &node.object_id, &node.relation, subject)
            .await?
        {
            return Ok(NodeVisit {
                node,
                depth,
                hit: true,
                usersets: Vec::new(),
            });
        }

        let tuples = self
            .store
            .find_tuples_for(&node.namespace, &node.object_id, &node.relation)
            .await?;
        let usersets = tuples
            .into_iter()
            .filter_map(|t| match t.key.subject {
                Subject::Userset(r) => Some(r),
                Subject::User { .. } => None,
            })
            .collect();

        Ok(NodeVisit {
            node,
            depth,
            hit: false,
            usersets,
        })
    }
}
