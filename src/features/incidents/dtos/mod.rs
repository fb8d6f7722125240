pub mod incident_dto;
pub mod query_dto;

pub use incident_dto::{
    CategoryStatDto, CategorySummaryDto, DeleteImagesDto, IncidentDto, IncidentListItemDto,
    IncidentStatsDto, UserSummaryDto,
};
pub use query_dto::{CategoryIncidentsQuery, ListIncidentsQuery, SortField, SortOrder};
