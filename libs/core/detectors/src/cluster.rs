// [libs/core/detectors/src/cluster.rs]
/*!
 * =================================================================
 * APARATO: TOPIC CLUSTERING ORACLE (V5.1 - DETERMINISTIC EMBEDDING)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L1)
 * RESPONSABILIDAD: AGRUPACIÓN SEMÁNTICA PURA DE TÓPICOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PURE FUNCTION CONTRACT: El embedding es una función determinista
 *    (modelo, tópico) -> vector; ningún ciclo de vida de modelo vive
 *    en este estrato.
 * 2. TRIGRAM HASHING: Bolsa de trigramas de caracteres proyectada por
 *    hashing a la dimensión configurada y normalizada L2; tópicos
 *    léxicamente afines caen en vecindades coseno cercanas.
 * 3. DBSCAN COSINE: Densidad sobre distancia coseno con eps y
 *    min_samples configurables; el ruido (-1) queda fuera de todo
 *    cluster reportado.
 *
 * # Mathematical Proof (Embedding Determinism):
 * El hash FNV-1a es una función pura de los bytes del trigrama y del
 * nombre del modelo (usado como semilla). Dos ejecuciones con la misma
 * configuración producen vectores bit-idénticos, haciendo el clustering
 * reproducible en cualquier host.
 * =================================================================
 */

use std::collections::BTreeSet;

/// Parámetros del oráculo de clustering.
#[derive(Debug, Clone)]
pub struct ClusteringDirectives {
    /// Nombre nominal del modelo de embedding (semilla del hashing).
    pub embedding_model: String,
    pub embedding_dimension: usize,
    /// Radio de densidad DBSCAN sobre distancia coseno.
    pub cluster_eps: f64,
    pub cluster_min_samples: usize,
    /// Tamaño mínimo de cluster reportable.
    pub cluster_min_size: usize,
}

/**
 * Agrupa tópicos semánticamente afines.
 *
 * Retorna únicamente clusters con tamaño >= cluster_min_size; los
 * tópicos ruido quedan omitidos. Con menos de dos tópicos no hay
 * estructura que descubrir.
 */
pub fn cluster_topics(topics: &[String], directives: &ClusteringDirectives) -> Vec<BTreeSet<String>> {
    if topics.len() < 2 || directives.embedding_dimension == 0 {
        return Vec::new();
    }

    let embeddings: Vec<Vec<f64>> = topics
        .iter()
        .map(|topic| embed_topic(topic, &directives.embedding_model, directives.embedding_dimension))
        .collect();

    let labels = dbscan_cosine(&embeddings, directives.cluster_eps, directives.cluster_min_samples);

    let cluster_count = labels.iter().filter_map(|&label| label).max().map(|m| m + 1).unwrap_or(0);
    let mut clusters: Vec<BTreeSet<String>> = vec![BTreeSet::new(); cluster_count];
    for (topic_index, label) in labels.iter().enumerate() {
        if let Some(cluster_index) = label {
            clusters[*cluster_index].insert(topics[topic_index].clone());
        }
    }

    clusters
        .into_iter()
        .filter(|cluster| cluster.len() >= directives.cluster_min_size)
        .collect()
}

/**
 * Embedding determinista: bolsa de trigramas proyectada por hashing.
 * El vector resultante está L2-normalizado (o nulo para texto vacío).
 */
pub fn embed_topic(topic: &str, embedding_model: &str, dimension: usize) -> Vec<f64> {
    let mut vector = vec![0.0_f64; dimension];

    let normalized_topic = topic.to_lowercase();
    let padded: Vec<char> = format!("^{}$", normalized_topic).chars().collect();
    if padded.len() < 3 {
        return vector;
    }

    for trigram_window in padded.windows(3) {
        let trigram: String = trigram_window.iter().collect();
        let bucket = (fnv1a_seeded(trigram.as_bytes(), embedding_model) as usize) % dimension;
        vector[bucket] += 1.0;
    }

    let magnitude: f64 = vector.iter().map(|component| component * component).sum::<f64>().sqrt();
    if magnitude > 0.0 {
        for component in vector.iter_mut() {
            *component /= magnitude;
        }
    }
    vector
}

/// Distancia coseno entre dos vectores L2-normalizados.
fn cosine_distance(left: &[f64], right: &[f64]) -> f64 {
    let dot_product: f64 = left.iter().zip(right.iter()).map(|(a, b)| a * b).sum();
    (1.0 - dot_product).clamp(0.0, 2.0)
}

/// FNV-1a de 64 bits sembrado con el nombre del modelo.
fn fnv1a_seeded(payload: &[u8], seed_label: &str) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash_state = FNV_OFFSET_BASIS;
    for byte in seed_label.bytes().chain(payload.iter().copied()) {
        hash_state ^= byte as u64;
        hash_state = hash_state.wrapping_mul(FNV_PRIME);
    }
    hash_state
}

/**
 * DBSCAN clásico sobre distancia coseno.
 * Retorna por punto Some(cluster) o None (ruido).
 */
fn dbscan_cosine(points: &[Vec<f64>], eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    let point_count = points.len();
    let mut labels: Vec<Option<usize>> = vec![None; point_count];
    let mut visited = vec![false; point_count];
    let mut next_cluster_index = 0usize;

    for seed_index in 0..point_count {
        if visited[seed_index] {
            continue;
        }
        visited[seed_index] = true;

        let seed_neighborhood = neighborhood(points, seed_index, eps);
        if seed_neighborhood.len() < min_samples {
            continue; // Ruido (puede ser adoptado luego como borde).
        }

        let cluster_index = next_cluster_index;
        next_cluster_index += 1;
        labels[seed_index] = Some(cluster_index);

        let mut expansion_frontier: Vec<usize> = seed_neighborhood;
        let mut frontier_cursor = 0usize;

        while frontier_cursor < expansion_frontier.len() {
            let neighbor_index = expansion_frontier[frontier_cursor];
            frontier_cursor += 1;

            if !visited[neighbor_index] {
                visited[neighbor_index] = true;
                let neighbor_neighborhood = neighborhood(points, neighbor_index, eps);
                if neighbor_neighborhood.len() >= min_samples {
                    for expansion_candidate in neighbor_neighborhood {
                        if !expansion_frontier.contains(&expansion_candidate) {
                            expansion_frontier.push(expansion_candidate);
                        }
                    }
                }
            }

            if labels[neighbor_index].is_none() {
                labels[neighbor_index] = Some(cluster_index);
            }
        }
    }

    labels
}

/// Índices dentro del radio eps (incluye el propio punto).
fn neighborhood(points: &[Vec<f64>], center_index: usize, eps: f64) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(candidate_index, candidate)| {
            *candidate_index == center_index
                || cosine_distance(&points[center_index], candidate) <= eps
        })
        .map(|(candidate_index, _)| candidate_index)
        .collect()
}
