/*!

This is the long-form manual for `vote_map` and `votemap`.

## Input formats

Two documents are needed to color a map: the election records and the
topology document.

### Election records

A CSV file with a header row. The columns are found by name, their order does
not matter and extra columns are ignored.

| column                        | level  | required | notes                                          |
|-------------------------------|--------|----------|------------------------------------------------|
| `year`                        | both   | yes      |                                                |
| `state`                       | state  | yes      | matched against the state names, uppercased    |
| `county_fips`                 | county | yes      | zero-padded to 5 digits, `6037.0` is accepted  |
| `party_simplified` or `party` | both   | yes      | `party_simplified` is used when both exist     |
| `candidatevotes`              | both   | yes      |                                                |
| `totalvotes`                  | both   | yes      | the same for all the rows of a region and year |
| `mode`                        | county | no       | reporting mode, see below                      |
| `candidate`                   | both   | no       | only used when merging reporting modes         |

State level:

```text
year,state,state_po,party_detailed,party_simplified,candidatevotes,totalvotes
1976,ALABAMA,AL,DEMOCRAT,DEMOCRAT,659170,1182850
1976,ALABAMA,AL,REPUBLICAN,REPUBLICAN,504070,1182850
```

County level:

```text
year,state,county_name,county_fips,candidate,party,candidatevotes,totalvotes,mode
2020,CALIFORNIA,LOS ANGELES,6037,JOSEPH R BIDEN JR,DEMOCRAT,3028885,4030779,TOTAL
2020,CALIFORNIA,LOS ANGELES,6037,DONALD J TRUMP,REPUBLICAN,916066,4030779,TOTAL
```

The reader is permissive: a vote count that is missing or not a number counts
as zero, and a row without a region key (empty, or `NA` as in the county
files) is dropped. Only a missing column is an error. The year must be written
as a plain number: a row for `2020.0` is not counted for 2020.

#### Reporting modes

Some states report their county results split by mode (election day, absentee,
provisional, ...). By default, only the rows in the `TOTAL` and `ELECTION DAY`
modes are aggregated, so that the other subsets are not counted twice. Rows
without a mode are always aggregated.

Alternatively, the split rows can be merged first (`--merge-modes`): the votes
of each candidate are summed over all the modes of a county, and the result is
treated as a `TOTAL` row.

#### Known limitations

- The votes of each party are not summed: if a region has several rows for the
  same party and year, the last row wins.
- The total of a region is the one of its first row. It is not checked against
  the other rows.
- Regions whose identifiers changed over the years (for example the Alaska
  districts, or Oglala Lakota county in South Dakota) show as "No data".

### Topology document

A [TopoJSON](https://github.com/topojson/topojson-specification) document, such
as the `counties-10m.json` file of the `us-atlas` project. The regions are read
from the `geometries` of one object of the topology: `states` for a state map,
`counties` for a county map. Another object can be selected with
`--topology-object`.

Counties are matched through their `id`, states through `properties.name`.

## Output

The render model is written in JSON, one entry per region in the order of the
topology document:

```json
{
  "year": 2020,
  "level": "county",
  "regions": [
    {
      "id": "06037",
      "name": "Los Angeles",
      "color": "#3d00c3",
      "tooltip": "Los Angeles: 75.1% Dem, 22.7% Rep",
      "dem": 3028885,
      "rep": 916066,
      "total": 4030779
    },
    {
      "id": "02063",
      "name": "Chugach",
      "color": "#d3d3d3",
      "tooltip": "Chugach: No data"
    }
  ]
}
```

The colors go from red (every vote Republican) through purple (tie) to blue
(every vote Democratic). Regions without data are gray (`#d3d3d3`). When the
configuration names the map (`outputSettings.mapName`), the name is added as a
top-level `mapName` field.

## Configuration

All the options can be given on the command line. They can also be stored in a
JSON file passed with `--config`. Paths in the file are relative to the file.
Command line options take precedence.

```json
{
  "outputSettings": {
    "mapName": "Counties 2020",
    "outputPath": "counties_2020.json"
  },
  "dataSource": {
    "level": "county",
    "filePath": "countypres_2000-2020.csv",
    "topologyPath": "counties-10m.json",
    "topologyObject": "counties",
    "reportingModes": ["TOTAL", "ELECTION DAY"],
    "mergeReportingModes": false
  },
  "selection": {
    "year": 2020
  }
}
```

`selection` also accepts `firstYear` and `lastYear` (numbers or strings) when
the dataset covers other years than the published ones (1976 to 2020 for
states, 2000 to 2020 for counties). Only every fourth year is selectable.

 */
