//! Repository Implementation

use crate::{StorageError, TripStore};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};
use trip::TripSummary;
use uuid::Uuid;

/// Trip repository (in-memory, newest last)
pub struct Repository {
    trips: Mutex<VecDeque<TripSummary>>,
    /// Max retained trips
    max_trips: usize,
}

impl Repository {
    pub fn new() -> Self {
        Self::with_retention(1000)
    }

    /// Repository keeping at most `max_trips` summaries
    pub fn with_retention(max_trips: usize) -> Self {
        info!("Creating in-memory trip repository (retention {})", max_trips);
        Self {
            trips: Mutex::new(VecDeque::with_capacity(max_trips.min(1024))),
            max_trips: max_trips.max(1),
        }
    }

    /// Insert a trip summary, evicting the oldest past retention
    pub fn insert_trip(&self, summary: TripSummary) -> Result<(), StorageError> {
        let mut trips = self
            .trips
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        while trips.len() >= self.max_trips {
            trips.pop_front();
        }

        debug!("Stored trip {} (score {})", summary.id, summary.safety_score);
        trips.push_back(summary);
        Ok(())
    }

    /// Most recent trips, newest first
    pub fn recent_trips(&self, limit: usize) -> Result<Vec<TripSummary>, StorageError> {
        let trips = self
            .trips
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        Ok(trips.iter().rev().take(limit).cloned().collect())
    }

    pub fn get_trip(&self, id: Uuid) -> Result<TripSummary, StorageError> {
        let trips = self
            .trips
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        trips
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    pub fn trip_count(&self) -> usize {
        self.trips.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut trips) = self.trips.lock() {
            trips.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TripStore for Repository {
    async fn persist(&self, summary: &TripSummary) -> Result<(), StorageError> {
        self.insert_trip(summary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn summary(score: u8) -> TripSummary {
        let started_at = Utc.with_ymd_and_hms(2024, 3, 10, 22, 0, 0).unwrap();
        TripSummary {
            id: Uuid::new_v4(),
            started_at,
            ended_at: started_at + Duration::minutes(45),
            duration_ms: 45 * 60 * 1000,
            alert_count: 1,
            sos_count: 0,
            distraction_count: 2,
            yawn_count: 3,
            safety_score: score,
        }
    }

    #[tokio::test]
    async fn test_persist_and_retrieve() {
        let repo = Repository::new();
        let trip = summary(83);

        repo.persist(&trip).await.unwrap();

        assert_eq!(repo.trip_count(), 1);
        assert_eq!(repo.get_trip(trip.id).unwrap(), trip);
        assert!(matches!(repo.get_trip(Uuid::new_v4()), Err(StorageError::NotFound)));
    }

    #[test]
    fn test_recent_trips_newest_first() {
        let repo = Repository::new();
        for score in [90, 80, 70] {
            repo.insert_trip(summary(score)).unwrap();
        }

        let recent = repo.recent_trips(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].safety_score, 70);
        assert_eq!(recent[1].safety_score, 80);
    }

    #[test]
    fn test_retention_limit() {
        let repo = Repository::with_retention(5);
        for score in 0..10 {
            repo.insert_trip(summary(score)).unwrap();
        }

        assert_eq!(repo.trip_count(), 5);
        assert_eq!(repo.recent_trips(10).unwrap().last().unwrap().safety_score, 5);

        repo.clear();
        assert_eq!(repo.trip_count(), 0);
    }
}
